//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes the inspection operations as MCP tools over stdio:
//!
//! - `har_load` - Load and index a capture
//! - `har_overview` - Dashboard of the loaded capture
//! - `har_list` - Filtered entry listing
//! - `har_detail` - One entry, previewed
//! - `har_expand` - Full content behind a ref id
//! - `har_search` - Text search
//! - `har_analyze` - Errors, security findings, slow requests
//! - `har_export` - Export plan
//!
//! The advertised tool list comes from [`tool_definitions`] and every call
//! goes through [`Inspector::call`], so names, descriptions, schemas and
//! argument validation are shared with the in-process dispatcher. Failures
//! come back as error outputs carrying the same text the CLI prints.

#![cfg(feature = "mcp")]

use std::sync::Arc;

use mcpkit::prelude::*;
use mcpkit::transport::stdio::StdioTransport;
use mcpkit::types::Tool as McpTool;
use serde_json::Value;

use crate::protocol::{tool_definitions, Inspector, ToolResult};

const SERVER_NAME: &str = "harscope";

const INSTRUCTIONS: &str =
    "Call har_load with a capture path first, then inspect it with the other tools.";

/// harscope MCP server.
#[derive(Debug, Clone)]
pub struct HarServer {
    inspector: Arc<Inspector>,
}

impl HarServer {
    /// Create a new MCP server instance.
    pub fn new(inspector: Inspector) -> Self {
        Self {
            inspector: Arc::new(inspector),
        }
    }

    /// Tool list advertised to clients.
    pub fn tools() -> Vec<McpTool> {
        tool_definitions()
            .into_iter()
            .map(|def| {
                McpTool::new(def.name)
                    .description(def.description)
                    .input_schema(def.input_schema)
            })
            .collect()
    }

    /// Run one tool call by protocol name.
    pub fn dispatch(&self, name: &str, args: Value) -> ToolOutput {
        output(self.inspector.call(name, args))
    }
}

fn output(result: ToolResult) -> ToolOutput {
    if result.is_error {
        ToolOutput::error(result.text)
    } else {
        ToolOutput::text(result.text)
    }
}

impl ServerHandler for HarServer {
    fn server_info(&self) -> ServerInfo {
        ServerInfo::new(SERVER_NAME, env!("CARGO_PKG_VERSION"))
    }

    fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities::new().with_tools()
    }

    fn instructions(&self) -> Option<String> {
        Some(INSTRUCTIONS.to_string())
    }
}

impl ToolHandler for HarServer {
    async fn list_tools(&self, _ctx: &Context<'_>) -> Result<Vec<McpTool>, McpError> {
        Ok(Self::tools())
    }

    async fn call_tool(
        &self,
        name: &str,
        args: Value,
        _ctx: &Context<'_>,
    ) -> Result<ToolOutput, McpError> {
        tracing::debug!(tool = name, "MCP tool call");
        Ok(self.dispatch(name, args))
    }
}

/// Run the MCP server on stdio.
pub async fn run_server(inspector: Inspector) -> crate::error::Result<()> {
    let server = HarServer::new(inspector);
    let transport = StdioTransport::new();

    tracing::info!("MCP server listening on stdio");
    ServerBuilder::new(server.clone())
        .with_tools(server)
        .build()
        .serve(transport)
        .await
        .map_err(|e| crate::error::HarError::Server {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::protocol::Tool;
    use crate::session::SessionManager;
    use std::time::Duration;

    fn server(dir: &std::path::Path) -> HarServer {
        let sessions = SessionManager::new(dir.join("sessions"), Duration::from_secs(60));
        HarServer::new(Inspector::new(sessions, &Config::default()))
    }

    fn text(output: ToolOutput) -> (String, bool) {
        let result = CallToolResult::from(output);
        let is_error = result.is_error();
        let json = serde_json::to_value(&result).unwrap();
        let text = json["content"][0]["text"].as_str().unwrap_or_default().to_string();
        (text, is_error)
    }

    #[test]
    fn test_tools_match_catalogue() {
        let tools = HarServer::tools();
        assert_eq!(tools.len(), Tool::ALL.len());
        for (tool, listed) in Tool::ALL.into_iter().zip(&tools) {
            assert_eq!(listed.name, tool.name());
            assert_eq!(listed.description.as_deref(), Some(tool.description()));
            assert_eq!(listed.input_schema, tool.input_schema());
        }
    }

    #[test]
    fn test_dispatch_accepts_numeric_status() {
        let dir = tempfile::tempdir().unwrap();
        let capture = dir.path().join("c.har");
        std::fs::write(
            &capture,
            r#"{"log":{"entries":[
                {"request":{"method":"GET","url":"https://a.com/ok"},"response":{"status":200}},
                {"request":{"method":"GET","url":"https://a.com/gone"},"response":{"status":404}}
            ]}}"#,
        )
        .unwrap();

        let server = server(dir.path());
        let (_, is_error) = text(server.dispatch(
            "har_load",
            json!({ "file": capture.display().to_string() }),
        ));
        assert!(!is_error);

        let (listed, is_error) = text(server.dispatch("har_list", json!({ "status": 404 })));
        assert!(!is_error, "{listed}");
        assert_eq!(listed, "[e1] GET /gone 404");
    }

    #[test]
    fn test_dispatch_reports_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let (message, is_error) = text(server.dispatch("har_list", json!({ "limit": "ten" })));
        assert!(is_error);
        assert!(message.contains("har_list"), "{message}");

        let (message, is_error) = text(server.dispatch("har_nope", Value::Null));
        assert!(is_error);
        assert!(message.contains("unknown tool"), "{message}");
    }
}
