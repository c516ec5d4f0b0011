//! harscope: inspect HAR captures from the command line or as an MCP server.

use std::process::ExitCode;

use harscope::cli;

fn main() -> ExitCode {
    // Logging is initialized by cli::run based on --log-level and --log-format
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_guidance() {
                eprintln!("{e}");
            } else {
                eprintln!("Error: {e}");
            }

            if std::env::var("RUST_BACKTRACE").is_ok() {
                if let Some(source) = std::error::Error::source(&e) {
                    eprintln!("Caused by: {source}");
                }
            }

            ExitCode::from(e.exit_code() as u8)
        }
    }
}
