//! Plan command: write the workflow without running the planner.

use std::path::PathBuf;

use clap::Parser;
use cryoflow_pegasus::Planner;
use cryoflow_pipeline::WorkflowSummary;
use serde::Serialize;

use super::{pipeline, summary_text};
use crate::cli::{CommandContext, GenerateArgs};
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};

/// Write sites.yml, transformations.yml, replicas.yml, workflow.yml and
/// pegasus.properties for the session
#[derive(Debug, Parser)]
pub struct PlanCommand {
    #[command(flatten)]
    pub generate: GenerateArgs,
}

#[derive(Debug, Serialize)]
struct PlanReport {
    summary: WorkflowSummary,
    files: Vec<PathBuf>,
    planner_command: Vec<String>,
}

impl FormattedOutput for PlanReport {
    fn format_text(&self) -> String {
        format!(
            "{}\n\nTo plan and submit, run from the workflow directory:\n  {}",
            summary_text(&self.summary, &self.files),
            self.planner_command.join(" ")
        )
    }
}

impl PlanCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let pipeline = pipeline(ctx, &self.generate)?;
        let (generated, files) = pipeline.write()?;

        let report = PlanReport {
            summary: generated.summary,
            files,
            planner_command: Planner::new().command_line(&pipeline.plan_options()),
        };
        print_output(ctx, &report)
    }
}
