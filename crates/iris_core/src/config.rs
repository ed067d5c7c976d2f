//! Layered configuration for the Iris binaries
//!
//! Defaults, then an optional TOML file, then `IRIS_*` environment variables
//! (`__` separates sections, e.g. `IRIS_TRAINING__SEED=7`). Command-line flags
//! are applied by each binary on top of the loaded value.

use crate::deterministic::SplitConfig;
use crate::errors::ConfigError;
use crate::training::{OutputPaths, TrainingConfig};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration file picked up from the working directory when no
/// explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "iris.toml";

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IrisConfig {
    pub paths: PathsConfig,
    pub training: TrainingSection,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Labeled training CSV
    pub csv: PathBuf,
    /// Model artifact
    pub model: PathBuf,
    /// Metrics record
    pub metrics: PathBuf,
    /// Species mapping
    pub mapping: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let outputs = OutputPaths::default();
        Self {
            csv: PathBuf::from("data/iris.csv"),
            model: outputs.model,
            metrics: outputs.metrics,
            mapping: outputs.mapping,
        }
    }
}

/// Split and classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSection {
    pub test_size: f64,
    pub shuffle: bool,
    pub seed: u64,
    pub var_smoothing: f64,
}

impl Default for TrainingSection {
    fn default() -> Self {
        let defaults = TrainingConfig::default();
        Self {
            test_size: defaults.split.test_size,
            shuffle: defaults.split.shuffle,
            seed: defaults.split.random_state,
            var_smoothing: defaults.var_smoothing,
        }
    }
}

/// Web UI listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl IrisConfig {
    /// Load defaults, the config file and the environment.
    ///
    /// An explicit `path` must exist; otherwise `iris.toml` in the working
    /// directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::Invalid(format!(
                    "configuration file {} not found (specified via --config)",
                    path.display()
                )))
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        };

        let mut builder = Config::builder().add_source(Config::try_from(&IrisConfig::default())?);

        if let Some(path) = &resolved {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("IRIS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: IrisConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: IrisConfig = Config::builder()
            .add_source(Config::try_from(&IrisConfig::default())?)
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.training;
        if !(t.test_size > 0.0 && t.test_size < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "training.test_size must be in (0, 1), got {}",
                t.test_size
            )));
        }
        if !(t.var_smoothing.is_finite() && t.var_smoothing > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "training.var_smoothing must be positive, got {}",
                t.var_smoothing
            )));
        }
        if self.web.host.trim().is_empty() {
            return Err(ConfigError::Invalid("web.host must not be empty".to_string()));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            split: SplitConfig {
                test_size: self.training.test_size,
                shuffle: self.training.shuffle,
                random_state: self.training.seed,
            },
            var_smoothing: self.training.var_smoothing,
        }
    }

    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths {
            model: self.paths.model.clone(),
            metrics: self.paths.metrics.clone(),
            mapping: self.paths.mapping.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_training_contract() {
        let config = IrisConfig::default();
        config.validate().unwrap();

        let training = config.training_config();
        assert_eq!(training.split.test_size, 0.2);
        assert!(training.split.shuffle);
        assert_eq!(training.split.random_state, 42);
        assert_eq!(config.paths.model, PathBuf::from("models/iris_nb.json"));
    }

    #[test]
    fn file_values_override_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[training]\ntest_size = 0.3\nseed = 7\n\n[paths]\ncsv = \"other.csv\"\n",
        )?;

        let config = IrisConfig::load(Some(&path))?;
        assert_eq!(config.training.test_size, 0.3);
        assert_eq!(config.training.seed, 7);
        assert!(config.training.shuffle);
        assert_eq!(config.paths.csv, PathBuf::from("other.csv"));
        assert_eq!(config.paths.metrics, PathBuf::from("models/metrics.json"));
        Ok(())
    }

    #[test]
    fn environment_overrides_file() -> anyhow::Result<()> {
        std::env::set_var("IRIS_WEB__PORT", "9123");
        let config = IrisConfig::load(None);
        std::env::remove_var("IRIS_WEB__PORT");

        assert_eq!(config?.web.port, 9123);
        Ok(())
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = IrisConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn out_of_range_test_size_is_rejected() {
        let err = IrisConfig::from_toml_str("[training]\ntest_size = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn toml_dump_parses_back() -> anyhow::Result<()> {
        let mut config = IrisConfig::default();
        config.training.seed = 99;
        let text = config.to_toml()?;
        assert_eq!(IrisConfig::from_toml_str(&text)?, config);
        Ok(())
    }
}
