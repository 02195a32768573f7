//! Config command implementation.

use clap::{Parser, Subcommand};
use cryoflow_common_config::{ConfigLoader, CryoflowConfig};
use serde::Serialize;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput, StatusOutput};

/// Manage configuration
#[derive(Debug, Parser)]
pub struct ConfigCommand {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file location
    Path,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct ShowOutput<'a> {
    config: &'a CryoflowConfig,
}

impl FormattedOutput for ShowOutput<'_> {
    fn format_text(&self) -> String {
        serde_yaml::to_string(self.config)
            .unwrap_or_else(|e| format!("# failed to render config: {e}"))
            .trim_end()
            .to_string()
    }
}

impl ConfigCommand {
    /// Whether the action needs the configuration file loaded.
    pub fn reads_config(&self) -> bool {
        matches!(self.action, ConfigAction::Show)
    }

    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        match &self.action {
            ConfigAction::Show => print_output(ctx, &ShowOutput { config: &ctx.config }),
            ConfigAction::Path => {
                match ctx.format {
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::json!({ "path": ctx.config_path, "exists": ctx.config_path.is_file() })
                    ),
                    OutputFormat::Text => println!("{}", ctx.config_path.display()),
                }
                Ok(())
            }
            ConfigAction::Init { force } => {
                let path = &ctx.config_path;
                if path.exists() && !force {
                    return Err(CliError::config_with_hint(
                        format!("{} already exists", path.display()),
                        "Pass --force to overwrite it",
                    ));
                }
                let written = ConfigLoader::from_file(path).save(&CryoflowConfig::default())?;
                print_output(
                    ctx,
                    &StatusOutput::success(format!("Wrote {}", written.display())),
                )
            }
        }
    }
}
