//! Output formatting utilities for CLI commands.

use serde::Serialize;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Trait for types that can be formatted for output
pub trait FormattedOutput {
    fn format_text(&self) -> String;

    fn format_json(&self) -> Result<String, serde_json::Error>
    where
        Self: Serialize,
    {
        serde_json::to_string_pretty(self)
    }
}

/// Print formatted output to stdout.
///
/// Text output is suppressed by `--quiet`; JSON is always printed.
pub fn print_output<T>(ctx: &CommandContext, value: &T) -> Result<(), CliError>
where
    T: FormattedOutput + Serialize,
{
    let output = match ctx.format {
        OutputFormat::Text if ctx.quiet => return Ok(()),
        OutputFormat::Text => value.format_text(),
        OutputFormat::Json => value.format_json()?,
    };

    println!("{output}");
    Ok(())
}

/// Helper for success/error status outputs
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub status: String,
    pub message: String,
}

impl StatusOutput {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

impl FormattedOutput for StatusOutput {
    fn format_text(&self) -> String {
        match self.status.as_str() {
            "success" => format!("✓ {}", self.message),
            _ => format!("{}: {}", self.status, self.message),
        }
    }
}
