//! Tool and environment detection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::env::{vars, Environment};

/// Wrapper scripts the generated transformations point at.
pub const WRAPPER_SCRIPTS: &[&str] = &[
    "imod_dm2mrc_wrapper.sh",
    "imod_newstack_wrapper.sh",
    "imod_clip_wrapper.sh",
    "cp_wrapper.sh",
    "motioncor2_wrapper.sh",
    "gctf_wrapper.sh",
    "e2proc2d_wrapper.sh",
];

/// Tool detection results.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
    pub available: bool,
}

/// System environment status.
#[derive(Debug, Clone)]
pub struct SystemStatus {
    pub tools: BTreeMap<String, ToolInfo>,
    pub pegasus_home: Option<PathBuf>,
    pub os: String,
    pub arch: String,
}

/// Environment detection utilities.
pub struct Detection;

impl Detection {
    /// Detect the workflow management and batch tools.
    pub fn scan() -> SystemStatus {
        let mut tools = BTreeMap::new();

        tools.insert("pegasus-plan".to_string(), Self::detect_with_version_arg("pegasus-plan", &["--version"]));
        tools.insert("pegasus-version".to_string(), Self::detect_with_version_arg("pegasus-version", &[]));
        tools.insert("condor_q".to_string(), Self::detect_with_version_arg("condor_q", &["-version"]));
        tools.insert("sbatch".to_string(), Self::detect_with_version_arg("sbatch", &["--version"]));

        SystemStatus {
            tools,
            pegasus_home: Environment::get(vars::PEGASUS_HOME)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Report which wrapper scripts are present under `scripts_dir`.
    pub fn wrapper_scripts(scripts_dir: &Path) -> BTreeMap<&'static str, bool> {
        WRAPPER_SCRIPTS
            .iter()
            .map(|name| (*name, scripts_dir.join(name).is_file()))
            .collect()
    }

    fn detect_with_version_arg(command: &str, args: &[&str]) -> ToolInfo {
        let mut tool_info = ToolInfo {
            name: command.to_string(),
            version: None,
            path: None,
            available: false,
        };

        if let Ok(output) = Command::new("which").arg(command).output() {
            if output.status.success() {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() {
                    tool_info.path = Some(PathBuf::from(&path_str));
                }
            }
        }

        if let Ok(output) = Command::new(command).args(args).output() {
            if output.status.success() {
                tool_info.available = true;
                let output_str = String::from_utf8_lossy(&output.stdout);
                tool_info.version = Self::extract_version(&output_str);
            }
        }

        tool_info
    }

    fn extract_version(output: &str) -> Option<String> {
        output
            .lines()
            .flat_map(str::split_whitespace)
            .map(|word| word.trim_matches(|c: char| c == ',' || c == '$'))
            .find(|word| Self::looks_like_version(word))
            .map(str::to_string)
    }

    fn looks_like_version(s: &str) -> bool {
        s.len() >= 3
            && s.starts_with(|c: char| c.is_ascii_digit())
            && s.contains('.')
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_extract_version() {
        assert_eq!(Detection::extract_version("Pegasus 5.0.6"), Some("5.0.6".to_string()));
        assert_eq!(
            Detection::extract_version("$CondorVersion: 10.2.1 2023-01-01 BuildID: 1 $"),
            Some("10.2.1".to_string())
        );
        assert_eq!(Detection::extract_version("slurm 23.02.4"), Some("23.02.4".to_string()));
        assert_eq!(Detection::extract_version("no version here"), None);
    }

    #[test]
    fn test_wrapper_scripts_reports_missing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("gctf_wrapper.sh"), "#!/bin/sh\n").unwrap();

        let found = Detection::wrapper_scripts(dir.path());
        assert_eq!(found.len(), WRAPPER_SCRIPTS.len());
        assert_eq!(found.get("gctf_wrapper.sh"), Some(&true));
        assert_eq!(found.get("motioncor2_wrapper.sh"), Some(&false));
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let info = Detection::detect_with_version_arg("cryoflow-no-such-tool", &["--version"]);
        assert!(!info.available);
        assert!(info.version.is_none());
    }
}
