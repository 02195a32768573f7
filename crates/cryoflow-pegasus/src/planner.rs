//! `pegasus-plan` invocation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::catalog::CatalogFile;
use crate::error::{PegasusError, Result};

/// Options passed to `pegasus-plan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Execution sites.
    pub sites: Vec<String>,
    /// Sites receiving staged-out outputs.
    pub output_sites: Vec<String>,
    /// Base submit directory.
    pub dir: PathBuf,
    /// Submit directory relative to `dir`.
    pub relative_dir: Option<String>,
    /// Job clustering styles.
    pub cluster: Vec<String>,
    /// Submit after planning.
    pub submit: bool,
    /// Abstract workflow file.
    pub workflow_file: PathBuf,
}

impl PlanOptions {
    /// Options for planning `workflow.yml` inside `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            sites: Vec::new(),
            output_sites: Vec::new(),
            dir: dir.into(),
            relative_dir: None,
            cluster: Vec::new(),
            submit: false,
            workflow_file: PathBuf::from("workflow.yml"),
        }
    }
}

/// Result of a planner run.
#[derive(Debug, Clone)]
pub struct PlanOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Submit directory reported by the planner, if found.
    pub submit_dir: Option<PathBuf>,
}

/// Runs `pegasus-plan`.
#[derive(Debug, Clone)]
pub struct Planner {
    program: PathBuf,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner {
    /// Use `pegasus-plan` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("pegasus-plan"),
        }
    }

    /// Use a specific planner executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments after the program name.
    pub fn arguments(&self, options: &PlanOptions) -> Vec<String> {
        let mut args = Vec::new();
        if options.submit {
            args.push("--submit".to_string());
        }
        if !options.sites.is_empty() {
            args.push("--sites".to_string());
            args.push(options.sites.join(","));
        }
        if !options.output_sites.is_empty() {
            args.push("--output-sites".to_string());
            args.push(options.output_sites.join(","));
        }
        args.push("--dir".to_string());
        args.push(options.dir.display().to_string());
        if let Some(relative) = &options.relative_dir {
            args.push("--relative-dir".to_string());
            args.push(relative.clone());
        }
        if !options.cluster.is_empty() {
            args.push("--cluster".to_string());
            args.push(options.cluster.join(","));
        }
        args.push(options.workflow_file.display().to_string());
        args
    }

    /// The full command line, for display.
    pub fn command_line(&self, options: &PlanOptions) -> Vec<String> {
        std::iter::once(self.program.display().to_string())
            .chain(self.arguments(options))
            .collect()
    }

    /// Run the planner from `options.dir`.
    #[instrument(skip(self, options), fields(dir = %options.dir.display(), submit = options.submit))]
    pub async fn plan(&self, options: &PlanOptions) -> Result<PlanOutput> {
        let args = self.arguments(options);
        debug!(program = %self.program.display(), ?args, "running planner");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&options.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| PegasusError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            warn!(exit_code, "planner failed");
            return Err(PegasusError::PlanFailed {
                code: exit_code,
                stderr: stderr.trim().to_string(),
            });
        }

        let submit_dir = parse_submit_dir(&stdout);
        if let Some(dir) = &submit_dir {
            info!(submit_dir = %dir.display(), "workflow planned");
        }

        Ok(PlanOutput {
            exit_code,
            stdout,
            stderr,
            submit_dir,
        })
    }
}

/// Pull the submit directory out of planner output. The planner ends with a
/// hint such as `pegasus-run  /path` or `pegasus-status -l /path`.
fn parse_submit_dir(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("pegasus-run") || line.starts_with("pegasus-status"))
        .filter_map(|line| line.split_whitespace().last())
        .find(|token| token.starts_with('/'))
        .map(PathBuf::from)
}

/// Write every catalog into `dir`, creating it if needed.
pub fn write_all(dir: &Path, catalogs: &[&dyn CatalogFile]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|source| PegasusError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    catalogs.iter().map(|catalog| catalog.write(dir)).collect()
}
