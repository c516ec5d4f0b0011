//! Command-line interface for harscope.
//!
//! Every inspection operation is a subcommand:
//! - `load`: index a capture and make it active
//! - `overview`, `list`, `detail`, `expand`: browse the active capture
//! - `search`, `analyze`: find entries worth a closer look
//! - `export`: plan (and optionally write) a filtered capture
//!
//! Results go to stdout; errors go to stderr with a non-zero exit code.
//! Session state lives on disk, so consecutive invocations share the
//! active capture.

mod commands;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{self, EntryArg, Inspector};
use crate::query::{SearchScope, StatusArg};

/// Token-budget-aware inspection of HAR captures.
#[derive(Debug, Parser)]
#[command(name = "harscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding session descriptors.
    #[arg(long, global = true, env = "HARSCOPE_SESSIONS_DIR")]
    pub sessions_dir: Option<PathBuf>,

    /// Path to custom configuration file.
    #[arg(long, global = true, env = "HARSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "HARSCOPE_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json, compact, pretty).
    #[arg(long, global = true, default_value = "text", env = "HARSCOPE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Log level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
    /// Pretty format with full details.
    Pretty,
}

impl LogLevel {
    /// Convert to tracing filter level.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load and index a HAR capture, replacing the active one.
    Load(LoadArgs),

    /// Show the dashboard of the active capture.
    #[command(alias = "ov")]
    Overview,

    /// List entries, optionally filtered.
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one entry.
    #[command(alias = "show")]
    Detail(DetailArgs),

    /// Print the full content behind a ref id.
    Expand(ExpandArgs),

    /// Search URLs, headers and bodies.
    #[command(alias = "s", alias = "find")]
    Search(SearchArgs),

    /// Run a heuristic analysis (errors, security, slow).
    Analyze(AnalyzeArgs),

    /// Plan an export, or write it with --output.
    #[command(alias = "x")]
    Export(ExportArgs),

    /// List persisted sessions.
    Sessions(SessionsArgs),

    /// Remove expired session descriptors.
    Clean,

    /// View configuration.
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Serve the operations as MCP tools over stdio.
    #[cfg(feature = "mcp")]
    Serve,

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the load command.
#[derive(Debug, Parser)]
pub struct LoadArgs {
    /// Path to the HAR capture file.
    pub file: PathBuf,
}

impl From<&LoadArgs> for protocol::LoadArgs {
    fn from(args: &LoadArgs) -> Self {
        Self {
            file: args.file.display().to_string(),
        }
    }
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Domain, exact or glob such as '*.example.com'.
    #[arg(short = 'd', long)]
    pub domain: Option<String>,

    /// Status code (404) or bucket (4xx).
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// HTTP method.
    #[arg(short = 'm', long)]
    pub method: Option<String>,

    /// URL substring (case-sensitive).
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// Maximum entries to show.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl From<&ListArgs> for protocol::ListArgs {
    fn from(args: &ListArgs) -> Self {
        Self {
            domain: args.domain.clone(),
            status: args.status.clone().map(StatusArg::Pattern),
            method: args.method.clone(),
            url: args.url.clone(),
            limit: args.limit,
        }
    }
}

/// Arguments for the detail command.
#[derive(Debug, Parser)]
pub struct DetailArgs {
    /// Entry index or label (14 or e14).
    pub entry: String,

    /// Print the whole entry as JSON.
    #[arg(long, conflicts_with = "section")]
    pub raw: bool,

    /// Print one section, e.g. response.body.
    #[arg(short = 's', long)]
    pub section: Option<String>,

    /// Print content in full instead of previews.
    #[arg(short = 'f', long)]
    pub full: bool,
}

impl From<&DetailArgs> for protocol::DetailArgs {
    fn from(args: &DetailArgs) -> Self {
        Self {
            entry: EntryArg::Label(args.entry.clone()),
            raw: args.raw.then_some(true),
            section: args.section.clone(),
            full: args.full.then_some(true),
        }
    }
}

/// Arguments for the expand command.
#[derive(Debug, Parser)]
pub struct ExpandArgs {
    /// Ref id such as e14.response.body.
    #[arg(value_name = "REF")]
    pub reference: String,
}

impl From<&ExpandArgs> for protocol::ExpandArgs {
    fn from(args: &ExpandArgs) -> Self {
        Self::new(args.reference.clone())
    }
}

/// Arguments for the search command.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Text to search for (case-insensitive).
    pub query: String,

    /// Where to search.
    #[arg(long, value_enum, default_value_t = SearchScope::All)]
    pub scope: SearchScope,

    /// Restrict to a domain, exact or glob.
    #[arg(short = 'd', long)]
    pub domain: Option<String>,

    /// Maximum matches to show.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl From<&SearchArgs> for protocol::SearchArgs {
    fn from(args: &SearchArgs) -> Self {
        Self {
            query: args.query.clone(),
            scope: args.scope,
            domain: args.domain.clone(),
            limit: args.limit,
        }
    }
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Analysis to run: errors, security or slow.
    #[arg(value_name = "TYPE")]
    pub kind: String,

    /// Slow-request threshold in milliseconds.
    #[arg(long)]
    pub threshold_ms: Option<f64>,

    /// Maximum findings to show.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl From<&AnalyzeArgs> for protocol::AnalyzeArgs {
    fn from(args: &AnalyzeArgs) -> Self {
        Self {
            kind: args.kind.clone(),
            threshold_ms: args.threshold_ms,
            limit: args.limit,
        }
    }
}

/// Arguments for the export command.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    /// Domain, exact or glob.
    #[arg(short = 'd', long)]
    pub domain: Option<String>,

    /// Status code or bucket.
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Replace credentials with [REDACTED].
    #[arg(long)]
    pub sanitize: bool,

    /// Drop request and response bodies.
    #[arg(long)]
    pub strip_bodies: bool,

    /// Write the filtered capture to this file.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

impl From<&ExportArgs> for protocol::ExportArgs {
    fn from(args: &ExportArgs) -> Self {
        Self {
            domain: args.domain.clone(),
            status: args.status.clone().map(StatusArg::Pattern),
            sanitize: args.sanitize.then_some(true),
            strip_bodies: args.strip_bodies.then_some(true),
        }
    }
}

/// Arguments for the sessions command.
#[derive(Debug, Parser)]
pub struct SessionsArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Config action to perform.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommand actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,

    /// Show configuration file path.
    Path,

    /// Write a configuration file with defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for the completions command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// PowerShell.
    Powershell,
    /// Elvish shell.
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completions and print to stdout.
pub fn generate_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, "harscope", &mut io::stdout());
}

/// Initialize logging based on CLI options.
fn init_logging(cli: &Cli) {
    use tracing_subscriber::{
        fmt::{self, format::FmtSpan},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));

    // stdout carries results and the MCP transport
    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

/// Resolve the effective configuration.
///
/// An explicit `--config` must load cleanly; a broken default file is
/// reported and replaced by defaults. `--sessions-dir` wins over the file.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable configuration");
            Config::default()
        }),
    };
    if let Some(dir) = &cli.sessions_dir {
        config.sessions.directory = Some(dir.clone());
    }
    Ok(config)
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    let config = load_config(&cli)?;
    debug!(command = ?cli.command, "Running command");

    match &cli.command {
        Commands::Completions(args) => {
            generate_completions(args.shell);
            Ok(())
        }
        Commands::Config(args) => commands::config::run(&cli, &config, args),
        Commands::Sessions(args) => commands::sessions::list(&config, args),
        Commands::Clean => commands::sessions::clean(&config),
        #[cfg(feature = "mcp")]
        Commands::Serve => commands::serve::run(Inspector::from_config(&config)?),
        command => {
            let inspector = Inspector::from_config(&config)?;
            commands::inspect::run(&inspector, command)
        }
    }
}
