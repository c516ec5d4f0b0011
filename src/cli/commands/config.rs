//! Config command implementation.

use crate::cli::{Cli, ConfigAction, ConfigArgs};
use crate::config::{default_config_path, Config};
use crate::error::{HarError, Result};

use super::emit;

/// Run the config command.
pub fn run(cli: &Cli, config: &Config, args: &ConfigArgs) -> Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };

    match &args.action {
        ConfigAction::Show => {
            let source = if path.exists() {
                path.display().to_string()
            } else {
                format!("{} (not present, using defaults)", path.display())
            };
            emit(&format!("# {source}\n{}", config.to_toml()?))
        }
        ConfigAction::Path => emit(&path.display().to_string()),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(HarError::InvalidConfig {
                    message: format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    ),
                });
            }
            Config::default().save_to(&path)?;
            emit(&format!("Wrote default configuration to {}", path.display()))
        }
    }
}
