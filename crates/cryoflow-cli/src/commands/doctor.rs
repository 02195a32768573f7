//! Doctor command implementation.

use clap::{Parser, ValueEnum};
use console::{style, Emoji};
use cryoflow_common_config::{ConfigLoader, CryoflowConfig, Detection};
use cryoflow_pipeline::discovery::{movie_regex, IMAGES_DIR};
use cryoflow_pipeline::{discover_session, find_files_regex};
use serde::Serialize;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};

static MICROSCOPE: Emoji<'_, '_> = Emoji("🔬 ", "");
static CHECK: Emoji<'_, '_> = Emoji("✓", "ok");
static CROSS: Emoji<'_, '_> = Emoji("✗", "x");
static WARNING: Emoji<'_, '_> = Emoji("⚠", "!");

/// Check tools, environment, configuration and session inputs
#[derive(Debug, Parser)]
pub struct DoctorCommand {
    /// Only check one component
    #[arg(long, value_enum)]
    check: Option<Component>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Component {
    Tools,
    Config,
    Inputs,
    Scripts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Serialize)]
struct Check {
    name: String,
    status: Status,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<String>,
}

impl Check {
    fn ok(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Ok,
            detail: detail.into(),
            fix: None,
        }
    }

    fn warn(name: impl Into<String>, detail: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Warn,
            detail: detail.into(),
            fix: Some(fix.into()),
        }
    }

    fn fail(name: impl Into<String>, detail: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Fail,
            detail: detail.into(),
            fix: Some(fix.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Section {
    name: &'static str,
    checks: Vec<Check>,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    sections: Vec<Section>,
    issues: Vec<String>,
    warnings: Vec<String>,
    ready: bool,
}

impl DoctorReport {
    fn new(sections: Vec<Section>) -> Self {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        for check in sections.iter().flat_map(|s| &s.checks) {
            let Some(fix) = &check.fix else { continue };
            match check.status {
                Status::Fail => issues.push(fix.clone()),
                Status::Warn => warnings.push(fix.clone()),
                Status::Ok => {}
            }
        }
        Self {
            ready: issues.is_empty(),
            sections,
            issues,
            warnings,
        }
    }
}

impl FormattedOutput for DoctorReport {
    fn format_text(&self) -> String {
        let mut lines = vec![format!("{MICROSCOPE}{}", style("cryoflow health check").bold()), String::new()];

        for section in &self.sections {
            lines.push(format!("{}", style(format!("{}:", section.name)).bold()));
            for check in &section.checks {
                let mark = match check.status {
                    Status::Ok => style(CHECK.to_string()).green(),
                    Status::Warn => style(WARNING.to_string()).yellow(),
                    Status::Fail => style(CROSS.to_string()).red(),
                };
                lines.push(format!("  {mark} {} {}", check.name, style(&check.detail).dim()));
            }
            lines.push(String::new());
        }

        if !self.issues.is_empty() {
            lines.push(format!("{}", style("Issues found:").red().bold()));
            lines.extend(self.issues.iter().enumerate().map(|(i, issue)| format!("  {}. {issue}", i + 1)));
            lines.push(String::new());
        }
        if !self.warnings.is_empty() {
            lines.push(format!("{}", style("Warnings:").yellow().bold()));
            lines.extend(self.warnings.iter().enumerate().map(|(i, w)| format!("  {}. {w}", i + 1)));
            lines.push(String::new());
        }

        let overall = if !self.issues.is_empty() {
            style("Not ready - fix issues above").red()
        } else if !self.warnings.is_empty() {
            style("Ready with warnings").yellow()
        } else {
            style("Ready to submit").green()
        };
        lines.push(format!("Overall: {overall}"));
        lines.join("\n")
    }
}

impl DoctorCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let mut sections = Vec::new();

        if self.should_check(Component::Tools) {
            sections.push(check_tools());
        }
        if self.should_check(Component::Config) {
            sections.push(check_config(ctx));
        }
        if self.should_check(Component::Inputs) {
            sections.push(check_inputs(&ctx.config));
        }
        if self.should_check(Component::Scripts) {
            sections.push(check_scripts(&ctx.config));
        }

        print_output(ctx, &DoctorReport::new(sections))
    }

    fn should_check(&self, component: Component) -> bool {
        self.check.map_or(true, |only| only == component)
    }
}

fn check_tools() -> Section {
    let status = Detection::scan();
    let mut checks = Vec::new();

    for (name, required) in [
        ("pegasus-plan", true),
        ("pegasus-version", false),
        ("condor_q", true),
        ("sbatch", false),
    ] {
        let Some(tool) = status.tools.get(name) else { continue };
        let check = if tool.available {
            Check::ok(name, tool.version.clone().unwrap_or_else(|| "installed".to_string()))
        } else if required {
            Check::fail(name, "not found", format!("Install {name} and put it on PATH"))
        } else {
            Check::warn(name, "not found", format!("{name} is missing; submission may still work"))
        };
        checks.push(check);
    }

    let home = match &status.pegasus_home {
        Some(home) if home.is_dir() => Check::ok("PEGASUS_HOME", home.display().to_string()),
        Some(home) => Check::fail(
            "PEGASUS_HOME",
            format!("{} does not exist", home.display()),
            "Point PEGASUS_HOME at the Pegasus installation",
        ),
        None => Check::fail("PEGASUS_HOME", "not set", "export PEGASUS_HOME=/path/to/pegasus"),
    };
    checks.push(home);
    checks.push(Check::ok("platform", format!("{}/{}", status.os, status.arch)));

    Section {
        name: "Environment",
        checks,
    }
}

fn check_config(ctx: &CommandContext) -> Section {
    let mut checks = Vec::new();

    let path = &ctx.config_path;
    checks.push(if path.is_file() {
        Check::ok("config file", path.display().to_string())
    } else {
        Check::warn(
            "config file",
            format!("{} not found, using defaults", path.display()),
            "Run `cryoflow config init` to write a config file",
        )
    });

    checks.push(match ConfigLoader::default().validate(&ctx.config) {
        Ok(()) => Check::ok("settings", "valid"),
        Err(e) => Check::fail("settings", e.to_string(), "Fix the setting in your config file"),
    });

    let session = &ctx.config.session;
    checks.push(Check::ok(
        "session",
        format!(
            "{} A/px, {} e/A2/frame, {} keV, {}{}",
            session.apix,
            session.fmdose,
            session.kev,
            session.basename_extension.extension(),
            if session.superresolution { ", super-resolution" } else { "" }
        ),
    ));

    Section {
        name: "Configuration",
        checks,
    }
}

fn check_inputs(config: &CryoflowConfig) -> Section {
    let inputs_dir = &config.paths.inputs_dir;
    let mut checks = Vec::new();

    if !inputs_dir.is_dir() {
        checks.push(Check::fail(
            "inputs dir",
            format!("{} does not exist", inputs_dir.display()),
            "Set paths.inputs_dir or pass --inputs",
        ));
        return Section {
            name: "Session inputs",
            checks,
        };
    }

    match discover_session(&config.session, inputs_dir) {
        Ok(inputs) => {
            checks.push(Check::ok("gain reference", inputs.gain_ref.display().to_string()));
            checks.push(Check::ok("defect map", inputs.defects_map.display().to_string()));
            checks.push(Check::ok(
                "movies",
                format!(
                    "{} found, {} will be processed",
                    inputs.movies.len(),
                    inputs.movies.len().min(config.run.sample_size())
                ),
            ));

            if let Ok(regex) = movie_regex(&config.session) {
                let anywhere = find_files_regex(inputs_dir, &regex).len();
                if anywhere > inputs.movies.len() {
                    checks.push(Check::warn(
                        "stray movies",
                        format!("{} matching files outside {IMAGES_DIR}/*/Data", anywhere - inputs.movies.len()),
                        format!("Only movies under {IMAGES_DIR}/<grid square>/Data are processed"),
                    ));
                }
            }
        }
        Err(e) => checks.push(Check::fail(
            "discovery",
            e.to_string(),
            "Check the session patterns in your config",
        )),
    }

    Section {
        name: "Session inputs",
        checks,
    }
}

fn check_scripts(config: &CryoflowConfig) -> Section {
    let scripts_dir = config.paths.scripts_dir();
    let checks = Detection::wrapper_scripts(&scripts_dir)
        .into_iter()
        .map(|(name, present)| {
            if present {
                Check::ok(name, "present")
            } else {
                Check::fail(
                    name,
                    format!("missing from {}", scripts_dir.display()),
                    format!("Install {name} under paths.base_dir/workflow/scripts"),
                )
            }
        })
        .collect();

    Section {
        name: "Wrapper scripts",
        checks,
    }
}
