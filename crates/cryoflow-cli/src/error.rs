//! CLI error handling and reporting.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use console::style;
use cryoflow_common_config::{ConfigError, EnvError};
use cryoflow_pegasus::PegasusError;
use cryoflow_pipeline::PipelineError;
use serde::Serialize;
use thiserror::Error;

use crate::cli::OutputFormat;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// CLI error type with rich context
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
        hint: Option<String>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
    },

    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        resource_type: String,
        resource_name: String,
        hint: Option<String>,
    },

    #[error("{message}")]
    Command {
        message: String,
        command: String,
        #[source]
        source: Option<BoxError>,
        hint: Option<String>,
    },

    #[error("{message}")]
    Pipeline {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "E001",
            Self::Io { .. } => "E002",
            Self::Validation { .. } => "E004",
            Self::NotFound { .. } => "E005",
            Self::Command { .. } => "E007",
            Self::Pipeline { .. } => "E011",
            Self::Other(_) => "E999",
        }
    }

    /// Numeric process exit status.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Config { .. } => 2,
            Self::Io { .. } => 3,
            Self::Validation { .. } => 5,
            Self::NotFound { .. } => 6,
            Self::Command { .. } => 8,
            Self::Pipeline { .. } => 11,
            Self::Other(_) => 1,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// Get hint for this error if available
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. }
            | Self::NotFound { hint, .. }
            | Self::Command { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    /// Create a config error with hint
    pub fn config_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            hint: Some(hint.into()),
        }
    }

    /// Create a not found error with hint
    pub fn not_found(
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        let resource_type = resource_type.into();
        let resource_name = resource_name.into();
        Self::NotFound {
            message: format!("{resource_type} not found: {resource_name}"),
            resource_type,
            resource_name,
            hint,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            path: None,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(anyhow::anyhow!("JSON serialization failed: {err}"))
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => Self::not_found(
                "config file",
                path.display().to_string(),
                Some("Run `cryoflow config init` to create one".to_string()),
            ),
            ConfigError::ValidationError { message } => Self::Validation {
                message: format!("Invalid configuration: {message}"),
                field: message.split_whitespace().next().map(str::to_string),
            },
            other => Self::Config {
                message: format!("Configuration error: {other}"),
                source: Some(Box::new(other)),
                hint: Some("Check your .cryoflow/config.yaml".to_string()),
            },
        }
    }
}

impl From<EnvError> for CliError {
    fn from(err: EnvError) -> Self {
        let EnvError::NotSet { var } = &err;
        let hint = format!("export {var}=...");
        Self::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
            hint: Some(hint),
        }
    }
}

impl From<PegasusError> for CliError {
    fn from(err: PegasusError) -> Self {
        match err {
            PegasusError::Spawn { program, source } => Self::Command {
                message: format!("failed to launch {program}: {source}"),
                command: program,
                source: Some(Box::new(source)),
                hint: Some("Is Pegasus installed and on PATH? Try `cryoflow doctor`".to_string()),
            },
            err @ PegasusError::PlanFailed { .. } => Self::Command {
                message: err.to_string(),
                command: "pegasus-plan".to_string(),
                source: Some(Box::new(err)),
                hint: None,
            },
            PegasusError::Write { path, source } => Self::Io {
                message: format!("failed to write {}: {source}", path.display()),
                source,
                path: Some(path),
            },
            other => Self::Pipeline {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Config(e) => e.into(),
            PipelineError::Env(e) => e.into(),
            PipelineError::Pegasus(e) => e.into(),
            PipelineError::MissingInput { kind, pattern, dir } => Self::not_found(
                kind,
                dir.join(&pattern).display().to_string(),
                Some("Check paths.inputs_dir and the session patterns in your config".to_string()),
            ),
            PipelineError::NoMovies { pattern } => Self::not_found(
                "movies",
                pattern,
                Some("Check session.basename_prefix, basename_suffix and basename_extension".to_string()),
            ),
            PipelineError::Io { path, source } => Self::Io {
                message: format!("{}: {source}", path.display()),
                source,
                path: Some(path),
            },
            other => Self::Pipeline {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
}

/// Print an error to stderr in the requested format.
pub fn report(error: &CliError, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let report = ErrorReport {
                code: error.code(),
                message: error.to_string(),
                hint: error.hint(),
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{error}"),
            }
        }
        OutputFormat::Text => {
            eprintln!("{} {error}", style("error:").red().bold());
            if let Some(hint) = error.hint() {
                eprintln!("  {} {hint}", style("hint:").cyan());
            }
        }
    }
}
