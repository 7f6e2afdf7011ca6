//! Dashboard configuration.
//!
//! A default configuration is embedded at compile time. A file given on
//! the command line is parsed on top of the defaults, so it only needs
//! the keys it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config/dashboard.toml");

/// Errors that can occur while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error (config file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Dashboard settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Feature collection location: a file path or an `http(s)` URL.
    pub data_source: String,
    /// Number of NAF codes kept by the top-codes chart.
    pub top_codes: usize,
    /// Number of months kept by the timeline chart.
    pub timeline_months: usize,
    /// Directory export files are written into.
    pub export_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_source: "etablissements.geojson".to_string(),
            top_codes: 10,
            timeline_months: 12,
            export_dir: PathBuf::from("."),
        }
    }
}

impl DashboardConfig {
    /// Parses the embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the embedded file is malformed.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_CONFIG)
    }

    /// Parses a configuration document. Missing keys take their default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if `text` is not valid TOML for this
    /// schema.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Loads the configuration from `path`, or the embedded default when
    /// no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Self::embedded();
        };
        log::debug!("Loading dashboard config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}
