//! Common test utilities for CLI testing.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use cryoflow_common_config::{ConfigLoader, CryoflowConfig};
use cryoflow_test_utils::SessionFixture;

/// A session on disk plus a config file pointing at it.
pub struct TestContext {
    pub session: SessionFixture,
    pub config_path: PathBuf,
}

impl TestContext {
    /// Session with `movies` movies and wrapper scripts installed.
    pub fn new(movies: usize) -> Self {
        let session = SessionFixture::new(movies).with_scripts();
        let config_path = session.root().join(".cryoflow").join("config.yaml");
        let ctx = Self {
            session,
            config_path,
        };
        ctx.write_config(|_| {});
        ctx
    }

    /// Rewrite the config file after adjusting the session defaults.
    pub fn write_config(&self, configure: impl FnOnce(&mut CryoflowConfig)) {
        let mut config = self.session.config();
        configure(&mut config);
        ConfigLoader::from_file(&self.config_path)
            .save(&config)
            .expect("Failed to write config");
    }

    pub fn path(&self) -> &Path {
        self.session.root()
    }

    /// Directory the workflow files are written to.
    pub fn workflow_dir(&self) -> PathBuf {
        self.session.config().paths.workflow_dir
    }

    /// Create a command configured for this context
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cryoflow").expect("Binary not found");
        cmd.current_dir(self.path())
            .env("CRYOFLOW_CONFIG", &self.config_path)
            .env("PEGASUS_HOME", "/opt/pegasus")
            .env("NO_COLOR", "1")
            .env_remove("CRYOFLOW_PEGASUS_PLAN")
            .env_remove("CRYOFLOW_LOG_LEVEL")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Install a fake planner that echoes its arguments and a submit dir.
    #[cfg(unix)]
    pub fn fake_planner(&self, exit_code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.path().join("fake-pegasus-plan");
        let script = format!(
            "#!/bin/sh\necho \"planned $@\"\necho \"pegasus-run  $PWD/submit/run0001\"\necho 'planner says no' >&2\nexit {exit_code}\n"
        );
        std::fs::write(&path, script).expect("Failed to write planner");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod planner");
        path
    }
}

/// Assert helpers for CLI output
pub trait OutputAssertions {
    fn assert_success(&self);
    fn assert_exit_code(&self, code: i32);
    fn stdout_json(&self) -> serde_json::Value;
}

impl OutputAssertions for Output {
    fn assert_success(&self) {
        assert!(
            self.status.success(),
            "Command failed with status: {}\nstderr: {}",
            self.status,
            String::from_utf8_lossy(&self.stderr)
        );
    }

    fn assert_exit_code(&self, code: i32) {
        assert_eq!(
            self.status.code(),
            Some(code),
            "Expected exit code {code}, got {:?}\nstderr: {}",
            self.status.code(),
            String::from_utf8_lossy(&self.stderr)
        );
    }

    fn stdout_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.stdout).unwrap_or_else(|e| {
            panic!(
                "stdout is not JSON: {e}\nstdout: {}",
                String::from_utf8_lossy(&self.stdout)
            )
        })
    }
}
