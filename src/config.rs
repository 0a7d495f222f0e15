//! Optional TOML settings shared by both command-line tools.
//!
//! Settings are read from an explicit `--config` path or from `config.toml`
//! inside the application directory. A missing default file yields defaults;
//! command-line flags override whatever the file provides.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::app_dirs::{self, AppDirError};
use crate::error::FailureKind;
use crate::rules::RuleComments;

/// File name of the settings file inside the application directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that may occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// A setting holds a value outside its domain.
    #[error("Invalid setting {key}: {reason}")]
    InvalidValue {
        /// Dotted key of the offending setting.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
}

impl ConfigError {
    /// Failure category of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Read { .. } => FailureKind::Io,
            _ => FailureKind::Configuration,
        }
    }
}

/// Settings consumed by the evaluator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluateSettings {
    /// Model artifact used when `--model` is not given.
    pub model: PathBuf,
    /// Name of the ground-truth label column.
    pub label_column: String,
    /// Name of the probability column added to prediction output.
    pub probability_column: String,
    /// Probabilities at or above this value count as positive.
    pub decision_threshold: f64,
}

impl Default for EvaluateSettings {
    fn default() -> Self {
        Self {
            model: PathBuf::from("model.json"),
            label_column: "NTproBNP_300".to_string(),
            probability_column: "prob_≥300".to_string(),
            decision_threshold: 0.5,
        }
    }
}

/// Settings consumed by the rule exporter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSettings {
    /// Destination used when `--out` is not given.
    pub out: PathBuf,
    /// THEN sentence for positive leaves.
    pub positive_comment: String,
    /// THEN sentence for negative leaves.
    pub negative_comment: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        let comments = RuleComments::default();
        Self {
            out: PathBuf::from("dss_rules.csv"),
            positive_comment: comments.positive,
            negative_comment: comments.negative,
        }
    }
}

impl ExportSettings {
    /// Rule sentences as used by the tree walker.
    pub fn comments(&self) -> RuleComments {
        RuleComments {
            positive: self.positive_comment.clone(),
            negative: self.negative_comment.clone(),
        }
    }
}

/// Logging preferences.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Also write a log file under the application directory.
    pub file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: false,
        }
    }
}

/// All settings read from the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub evaluate: EvaluateSettings,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Trim string settings and reject values outside their domain.
    pub fn normalized(mut self) -> Result<Self, ConfigError> {
        self.evaluate.label_column = self.evaluate.label_column.trim().to_string();
        self.evaluate.probability_column = self.evaluate.probability_column.trim().to_string();
        self.logging.level = self.logging.level.trim().to_string();
        check_threshold(self.evaluate.decision_threshold)?;
        if self.evaluate.label_column.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "evaluate.label_column",
                reason: "must not be empty".to_string(),
            });
        }
        if self.evaluate.probability_column.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "evaluate.probability_column",
                reason: "must not be empty".to_string(),
            });
        }
        if self.logging.level.is_empty() {
            self.logging.level = LoggingSettings::default().level;
        }
        Ok(self)
    }
}

/// Reject decision thresholds outside `[0, 1]`.
pub fn check_threshold(threshold: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ConfigError::InvalidValue {
            key: "evaluate.decision_threshold",
            reason: format!("{threshold} is outside [0, 1]"),
        })
    }
}

/// Resolve the default settings file path inside the application directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_path().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load settings from `explicit` or from the default location.
///
/// An explicit path must exist; the default file is optional, and so is the
/// directory that would hold it.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    match explicit {
        Some(path) => load_settings_from(path),
        None => load_default_settings(config_path()),
    }
}

fn load_default_settings(path: Result<PathBuf, ConfigError>) -> Result<Settings, ConfigError> {
    let path = match path {
        Ok(path) => path,
        Err(ConfigError::NoConfigDir) => {
            tracing::debug!("No config directory available; using default settings");
            return Ok(Settings::default());
        }
        Err(err) => return Err(err),
    };
    if !path.exists() {
        return Ok(Settings::default());
    }
    load_settings_from(&path)
}

/// Parse and validate a settings file.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: Settings = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = settings.normalized()?;
    tracing::debug!(path = %path.display(), "Loaded settings");
    Ok(settings)
}

fn map_app_dir_error(error: AppDirError) -> ConfigError {
    match error {
        AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        AppDirError::CreateDir { path, source } => ConfigError::Read { path, source },
    }
}
