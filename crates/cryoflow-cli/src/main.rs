//! cryoflow - cryo-EM pre-processing workflows for Pegasus
//!
//! Main entry point for the `cryoflow` binary.

use std::process::ExitCode;

use clap::Parser;
use cryoflow_common_config::{vars, Environment};
use cryoflow_common_log::LogConfig;

use cryoflow_cli::cli::Cli;
use cryoflow_cli::error::{report, CliError};

/// Application exit codes
#[repr(u8)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    // .env must be loaded before clap reads env-backed flags
    Environment::init();

    let cli = Cli::parse();
    init_tracing(&cli);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            return Exit::GeneralError.into();
        }
    };

    let format = cli.format;
    match runtime.block_on(run(cli)) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            report(&e, format);
            e.exit_code()
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.load_config()?;
    cli.execute(config).await
}

fn init_tracing(cli: &Cli) {
    let level_from_env =
        Environment::get(vars::CRYOFLOW_LOG_LEVEL).is_some_and(|v| !v.is_empty());
    let config = cli.log_config(LogConfig::from_env(), level_from_env);

    if let Err(e) = cryoflow_common_log::init(config) {
        eprintln!("warning: {e}");
    }
}
