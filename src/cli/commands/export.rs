//! Export command implementation.
//!
//! Prints the export plan; with `--output`, also writes the filtered
//! capture as HAR JSON.

use tracing::info;

use crate::cli::ExportArgs;
use crate::error::Result;
use crate::export::{render, write_har};
use crate::protocol::Inspector;

use super::emit;

/// Run the export command.
pub fn run(inspector: &Inspector, args: &ExportArgs) -> Result<()> {
    let (session, plan) = inspector.plan_export(&args.into())?;
    let mut text = plan.summary();

    if let Some(output) = &args.output {
        let har = inspector.sessions().load_capture(&session)?;
        write_har(output, &render(&plan, &har))?;
        info!(path = %output.display(), entries = plan.len(), "Export written");
        text.push_str(&format!(
            "\nWrote {} entries to {}",
            plan.len(),
            output.display()
        ));
    }

    emit(&text)
}
