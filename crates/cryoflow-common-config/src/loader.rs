//! Configuration file loading and parsing.

use crate::types::CryoflowConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Directory holding the project configuration.
pub const CONFIG_DIR: &str = ".cryoflow";

/// Name of the configuration file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.yaml";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
    explicit_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
            explicit_file: None,
        }
    }

    /// Create a loader for an explicit configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            base_path: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            explicit_file: Some(path.to_path_buf()),
        }
    }

    /// Path the loader reads from.
    pub fn config_path(&self) -> PathBuf {
        match &self.explicit_file {
            Some(path) => path.clone(),
            None => self.base_path.join(CONFIG_DIR).join(CONFIG_FILE),
        }
    }

    /// Load and validate configuration, falling back to defaults when the
    /// project file is absent.
    pub fn load(&self) -> Result<CryoflowConfig, ConfigError> {
        let config = self.load_unchecked()?;
        self.validate(&config)?;
        Ok(config)
    }

    /// Load configuration without validating values.
    ///
    /// Used by commands that report on or replace a broken file.
    pub fn load_unchecked(&self) -> Result<CryoflowConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            if self.explicit_file.is_some() {
                return Err(ConfigError::NotFound { path: config_path });
            }
            debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(CryoflowConfig::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let config = self.parse_unchecked(&contents)?;
        debug!(path = %config_path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn parse(&self, contents: &str) -> Result<CryoflowConfig, ConfigError> {
        let config = self.parse_unchecked(contents)?;
        self.validate(&config)?;
        Ok(config)
    }

    /// Expand environment variables and parse, skipping validation.
    pub fn parse_unchecked(&self, contents: &str) -> Result<CryoflowConfig, ConfigError> {
        let expanded = self.expand_env_vars(contents)?;

        let config: CryoflowConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        Ok(config)
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env var pattern is valid")
        });

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let full_match = &cap[0];
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result = result.replace(full_match, &value);
        }

        Ok(result)
    }

    /// Validate configuration values.
    pub fn validate(&self, config: &CryoflowConfig) -> Result<(), ConfigError> {
        let invalid = |message: &str| {
            Err(ConfigError::ValidationError {
                message: message.to_string(),
            })
        };

        if !(config.session.apix > 0.0) {
            return invalid("session.apix must be greater than 0");
        }
        if !(config.session.fmdose > 0.0) {
            return invalid("session.fmdose must be greater than 0");
        }
        if config.session.kev == 0 {
            return invalid("session.kev must be greater than 0");
        }
        if config.session.raw_gain_ref.trim().is_empty() {
            return invalid("session.raw_gain_ref cannot be empty");
        }
        if config.session.raw_defects_map.trim().is_empty() {
            return invalid("session.raw_defects_map cannot be empty");
        }
        if config.session.basename_suffix.is_empty() {
            return invalid("session.basename_suffix cannot be empty");
        }
        if config.cluster.site_name.trim().is_empty() {
            return invalid("cluster.site_name cannot be empty");
        }
        if config.cluster.site_name == "local" {
            return invalid("cluster.site_name cannot be 'local'");
        }
        if config.run.workflow_name.trim().is_empty() {
            return invalid("run.workflow_name cannot be empty");
        }
        if config.run.max_movies == Some(0) {
            return invalid("run.max_movies must be greater than 0");
        }

        Ok(())
    }

    /// Save configuration to the project file.
    pub fn save(&self, config: &CryoflowConfig) -> Result<PathBuf, ConfigError> {
        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(&config_path, yaml)?;
        Ok(config_path)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MovieFormat;
    use std::fs;
    use tempfile::tempdir;

    fn write_project_config(dir: &Path, contents: &str) {
        let config_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), contents).unwrap();
    }

    #[test]
    fn test_load_defaults_when_no_file() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());
        let config = loader.load().unwrap();
        assert_eq!(config.cluster.site_name, "slurm");
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::from_file(dir.path().join("missing.yaml"));
        match loader.load().unwrap_err() {
            ConfigError::NotFound { path } => assert!(path.ends_with("missing.yaml")),
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_load_config_from_yaml_file() {
        let dir = tempdir().unwrap();
        write_project_config(
            dir.path(),
            r#"
session:
  apix: 0.834
  fmdose: 1.2
  kev: 300
  basename_extension: mrc
  throw: 1
cluster:
  project: osinski_703
run:
  debug: true
"#,
        );

        let config = ConfigLoader::new(dir.path()).load().unwrap();

        assert_eq!(config.session.apix, 0.834);
        assert_eq!(config.session.fmdose, 1.2);
        assert_eq!(config.session.basename_extension, MovieFormat::Mrc);
        assert_eq!(config.session.throw, 1);
        assert_eq!(config.cluster.project.as_deref(), Some("osinski_703"));
        assert!(config.run.debug);

        // Unspecified values use defaults
        assert_eq!(config.session.trunc, 0);
        assert_eq!(config.cluster.queue, "main");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.yaml");
        fs::write(&path, "session:\n  kev: 200\n").unwrap();

        let config = ConfigLoader::from_file(&path).load().unwrap();
        assert_eq!(config.session.kev, 200);
    }

    #[test]
    fn test_load_unchecked_keeps_invalid_values() {
        let dir = tempdir().unwrap();
        write_project_config(dir.path(), "session:\n  apix: 0\n");
        let loader = ConfigLoader::new(dir.path());

        assert!(matches!(
            loader.load().unwrap_err(),
            ConfigError::ValidationError { .. }
        ));

        let config = loader.load_unchecked().unwrap();
        assert_eq!(config.session.apix, 0.0);
        assert!(loader.validate(&config).is_err());
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("CRYOFLOW_TEST_APIX", "1.06");
        let loader = ConfigLoader::new(".");
        let config = loader
            .parse("session:\n  apix: ${CRYOFLOW_TEST_APIX}\n  kev: ${CRYOFLOW_TEST_KEV:-200}\n")
            .unwrap();
        assert_eq!(config.session.apix, 1.06);
        assert_eq!(config.session.kev, 200);
        std::env::remove_var("CRYOFLOW_TEST_APIX");
    }

    #[test]
    fn test_env_var_missing_error() {
        let loader = ConfigLoader::new(".");
        match loader.expand_env_vars("key: ${CRYOFLOW_MISSING_VAR}").unwrap_err() {
            ConfigError::EnvVarNotFound { var } => assert_eq!(var, "CRYOFLOW_MISSING_VAR"),
            other => panic!("Expected EnvVarNotFound error, got {other:?}"),
        }
    }

    fn assert_invalid(mutate: impl FnOnce(&mut CryoflowConfig), field: &str) {
        let mut config = CryoflowConfig::default();
        mutate(&mut config);
        match ConfigLoader::new(".").validate(&config).unwrap_err() {
            ConfigError::ValidationError { message } => {
                assert!(message.contains(field), "{message} should mention {field}")
            }
            other => panic!("Expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_errors() {
        assert_invalid(|c| c.session.apix = 0.0, "session.apix");
        assert_invalid(|c| c.session.fmdose = -1.0, "session.fmdose");
        assert_invalid(|c| c.session.kev = 0, "session.kev");
        assert_invalid(|c| c.session.raw_gain_ref = " ".into(), "session.raw_gain_ref");
        assert_invalid(|c| c.cluster.site_name = "local".into(), "cluster.site_name");
        assert_invalid(|c| c.run.max_movies = Some(0), "run.max_movies");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigLoader::new(".").validate(&CryoflowConfig::default()).is_ok());
    }

    #[test]
    fn test_parse_error_with_line_number() {
        let loader = ConfigLoader::new(".");
        let result = loader.parse("session:\n  apix: 1.0\n  bad: [unclosed\n");
        match result.unwrap_err() {
            ConfigError::ParseError { line, .. } => assert!(line.is_some()),
            other => panic!("Expected ParseError with line number, got {other:?}"),
        }
    }

    #[test]
    fn test_save_config() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());

        let mut config = CryoflowConfig::default();
        config.session.apix = 0.5;
        config.run.max_movies = Some(42);

        let path = loader.save(&config).unwrap();
        assert!(path.ends_with(".cryoflow/config.yaml"));

        let loaded = loader.load().unwrap();
        assert_eq!(loaded.session.apix, 0.5);
        assert_eq!(loaded.run.max_movies, Some(42));
    }
}
