//! Submit command: write the workflow and hand it to pegasus-plan.

use std::path::PathBuf;

use clap::Parser;
use cryoflow_pegasus::Planner;
use cryoflow_pipeline::WorkflowSummary;
use serde::Serialize;
use tracing::info;

use super::{pipeline, summary_text};
use crate::cli::{CommandContext, GenerateArgs};
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};

/// Generate the workflow and submit it with pegasus-plan --submit
#[derive(Debug, Parser)]
pub struct SubmitCommand {
    #[command(flatten)]
    pub generate: GenerateArgs,

    /// Write the workflow and print the planner command without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Planner executable
    #[arg(
        long,
        hide = true,
        env = "CRYOFLOW_PEGASUS_PLAN",
        default_value = "pegasus-plan"
    )]
    pub planner: PathBuf,
}

#[derive(Debug, Serialize)]
struct SubmitReport {
    summary: WorkflowSummary,
    files: Vec<PathBuf>,
    planner_command: Vec<String>,
    submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    submit_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "String::is_empty")]
    planner_output: String,
}

impl FormattedOutput for SubmitReport {
    fn format_text(&self) -> String {
        let mut out = summary_text(&self.summary, &self.files);
        if !self.submitted {
            out.push_str("\n\nDry run, planner not started:\n  ");
            out.push_str(&self.planner_command.join(" "));
            return out;
        }
        if !self.planner_output.trim().is_empty() {
            out.push_str("\n\n");
            out.push_str(self.planner_output.trim_end());
        }
        if let Some(dir) = &self.submit_dir {
            out.push_str(&format!("\n\nSubmitted. Monitor with:\n  pegasus-status -l {}", dir.display()));
        }
        out
    }
}

impl SubmitCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let pipeline = pipeline(ctx, &self.generate)?;
        let planner = Planner::with_program(&self.planner);
        let planner_command = planner.command_line(&pipeline.plan_options());

        let report = if self.dry_run {
            let (generated, files) = pipeline.write()?;
            SubmitReport {
                summary: generated.summary,
                files,
                planner_command,
                submitted: false,
                submit_dir: None,
                planner_output: String::new(),
            }
        } else {
            info!(command = %planner_command.join(" "), "submitting workflow");
            let submission = pipeline.submit(&planner).await?;
            SubmitReport {
                summary: submission.summary,
                files: submission.files,
                planner_command,
                submitted: true,
                submit_dir: submission.plan.submit_dir,
                planner_output: submission.plan.stdout,
            }
        };
        print_output(ctx, &report)
    }
}
