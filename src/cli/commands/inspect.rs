//! Inspection commands: load, overview, list, detail, expand, search, analyze.

use crate::cli::Commands;
use crate::error::Result;
use crate::protocol::Inspector;

use super::emit;

/// Run one inspection command against the active session.
pub fn run(inspector: &Inspector, command: &Commands) -> Result<()> {
    let text = match command {
        Commands::Load(args) => inspector.try_load(&args.into())?,
        Commands::Overview => inspector.try_overview()?,
        Commands::List(args) => inspector.try_list(&args.into())?,
        Commands::Detail(args) => inspector.try_detail(&args.into())?,
        Commands::Expand(args) => inspector.try_expand(&args.into())?,
        Commands::Search(args) => inspector.try_search(&args.into())?,
        Commands::Analyze(args) => inspector.try_analyze(&args.into())?,
        Commands::Export(args) => return super::export::run(inspector, args),
        other => {
            return Err(crate::error::HarError::Unsupported {
                feature: format!("{other:?} is not an inspection command"),
            })
        }
    };
    emit(&text)
}
