//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use cryoflow_common_config::{ConfigLoader, CryoflowConfig};
use cryoflow_common_log::{LogConfig, LogLevel};

use crate::commands::{ConfigCommand, DoctorCommand, PlanCommand, SubmitCommand};
use crate::error::CliError;

/// cryoflow - cryo-EM pre-processing workflows for Pegasus
///
/// Generates MotionCor2, Gctf and e2proc2d workflows for a microscope
/// session and hands them to pegasus-plan.
#[derive(Debug, Parser)]
#[command(
    name = "cryoflow",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "CRYOFLOW_CONFIG",
        value_hint = ValueHint::FilePath
    )]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the workflow and catalogs without planning
    #[command(visible_alias = "generate")]
    Plan(PlanCommand),

    /// Write the workflow and run pegasus-plan --submit
    Submit(SubmitCommand),

    /// Check tools, environment and session inputs
    Doctor(DoctorCommand),

    /// Manage configuration
    Config(ConfigCommand),

    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsCommand),
}

/// Overrides shared by the workflow-generating commands.
#[derive(Debug, Clone, Default, Args)]
pub struct GenerateArgs {
    /// Directory holding the session's raw inputs
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub inputs: Option<PathBuf>,

    /// Directory final outputs are staged to
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub outputs: Option<PathBuf>,

    /// Directory the workflow files and scratch space are written to
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub workflow_dir: Option<PathBuf>,

    /// Directory holding the wrapper scripts under scripts/
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub base_dir: Option<PathBuf>,

    /// Debug mode: small sample, small clusters, low job limit
    #[arg(long)]
    pub debug: bool,

    /// Number of movies to sample
    #[arg(long)]
    pub max_movies: Option<usize>,

    /// Seed for movie sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pegasus installation, exported to jobs on the execution site
    #[arg(long, env = "PEGASUS_HOME", value_hint = ValueHint::DirPath)]
    pub pegasus_home: Option<PathBuf>,
}

impl GenerateArgs {
    /// Apply the overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut CryoflowConfig) {
        if let Some(inputs) = &self.inputs {
            config.paths.inputs_dir = inputs.clone();
        }
        if let Some(outputs) = &self.outputs {
            config.paths.outputs_dir = outputs.clone();
        }
        if let Some(dir) = &self.workflow_dir {
            config.paths.workflow_dir = dir.clone();
        }
        if let Some(base) = &self.base_dir {
            config.paths.base_dir = base.clone();
        }
        if self.debug {
            config.run.debug = true;
        }
        if self.max_movies.is_some() {
            config.run.max_movies = self.max_movies;
        }
        if self.seed.is_some() {
            config.run.seed = self.seed;
        }
    }
}

/// Shell completions generation
#[derive(Debug, Parser)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

impl Cli {
    fn loader(&self) -> ConfigLoader {
        match &self.config {
            Some(path) => ConfigLoader::from_file(path),
            None => ConfigLoader::default(),
        }
    }

    /// Apply `-v`/`-q` on top of the environment's logging settings.
    ///
    /// Without flags or `CRYOFLOW_LOG_LEVEL`, text-mode `plan` and `submit`
    /// log progress at info; everything else logs warnings only.
    pub fn log_config(&self, mut config: LogConfig, level_from_env: bool) -> LogConfig {
        if self.verbose > 0 || self.quiet || !level_from_env {
            let level = match self.verbose {
                0 if !self.quiet && self.reports_progress() => LogLevel::Info,
                v => LogLevel::from_verbosity(v, self.quiet),
            };
            config = config.with_level(level);
        }
        config.with_target = self.verbose >= 2;
        config.span_events = self.verbose >= 3;
        config
    }

    fn reports_progress(&self) -> bool {
        self.format == OutputFormat::Text
            && matches!(self.command, Command::Plan(_) | Command::Submit(_))
    }

    /// Load configuration from file or default locations.
    ///
    /// A missing `.cryoflow/config.yaml` falls back to built-in defaults; a
    /// missing file named with `--config` is an error. Only the commands that
    /// generate a workflow reject invalid values here; `doctor` reports them
    /// and `config init` replaces the file without reading it.
    pub fn load_config(&self) -> Result<CryoflowConfig, CliError> {
        let loader = self.loader();
        let config = match &self.command {
            Command::Plan(_) | Command::Submit(_) => loader.load()?,
            Command::Doctor(_) => loader.load_unchecked()?,
            Command::Config(cmd) if cmd.reads_config() => loader.load_unchecked()?,
            Command::Config(_) | Command::Completions(_) => CryoflowConfig::default(),
        };
        Ok(config)
    }

    /// Execute the selected command
    pub async fn execute(self, config: CryoflowConfig) -> Result<(), CliError> {
        let ctx = CommandContext {
            config,
            config_path: self.loader().config_path(),
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
        };

        match self.command {
            Command::Plan(cmd) => cmd.execute(&ctx),
            Command::Submit(cmd) => cmd.execute(&ctx).await,
            Command::Doctor(cmd) => cmd.execute(&ctx),
            Command::Config(cmd) => cmd.execute(&ctx),
            Command::Completions(cmd) => cmd.execute(&ctx),
        }
    }
}

impl CompletionsCommand {
    /// Execute the completions command
    pub fn execute(&self, _ctx: &CommandContext) -> Result<(), CliError> {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(self.shell, &mut cmd, name, &mut std::io::stdout());
        Ok(())
    }
}

/// Context passed to all commands
#[derive(Debug)]
pub struct CommandContext {
    pub config: CryoflowConfig,
    pub config_path: PathBuf,
    pub format: OutputFormat,
    pub quiet: bool,
    pub verbose: u8,
}
