//! Command implementations.

mod config;
mod doctor;
mod plan;
mod submit;

pub use config::ConfigCommand;
pub use doctor::DoctorCommand;
pub use plan::PlanCommand;
pub use submit::SubmitCommand;

use std::fmt::Write as _;
use std::path::PathBuf;

use cryoflow_pipeline::{PipelineWorkflow, WorkflowSummary};

use crate::cli::{CommandContext, GenerateArgs};
use crate::error::CliError;

/// Build the pipeline for the loaded config plus command-line overrides.
fn pipeline(ctx: &CommandContext, args: &GenerateArgs) -> Result<PipelineWorkflow, CliError> {
    let mut config = ctx.config.clone();
    args.apply(&mut config);

    let mut pipeline = PipelineWorkflow::new(config)?;
    if let Some(home) = &args.pegasus_home {
        pipeline = pipeline.with_pegasus_home(home);
    }
    Ok(pipeline)
}

fn summary_text(summary: &WorkflowSummary, files: &[PathBuf]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Workflow '{}' for site {}{}",
        summary.workflow_name,
        summary.execution_site,
        if summary.debug { " (debug)" } else { "" }
    );
    let _ = writeln!(
        out,
        "  movies: {} sampled of {} found",
        summary.movies_sampled, summary.movies_discovered
    );
    let _ = writeln!(out, "  jobs:   {}", summary.total_jobs);
    for (transformation, count) in &summary.jobs_by_transformation {
        let _ = writeln!(out, "    {transformation:<22} {count}");
    }
    let _ = writeln!(out, "  files:  {} registered replicas", summary.replicas);
    let _ = writeln!(out, "Wrote {}:", summary.workflow_dir.display());
    for file in files {
        let name = file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let _ = writeln!(out, "  {name}");
    }
    out.trim_end().to_string()
}
