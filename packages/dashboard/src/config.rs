//! Explorer configuration.
//!
//! The defaults are compiled in from `config/default.toml`. A file named by
//! `NJ_SDWA_CONFIG` replaces them wholesale, after which `ECHO_QUERY_URL`
//! and `EJ_DB_PATH` override single fields.

use std::path::{Path, PathBuf};

use nj_sdwa_source::SourceEndpoints;
use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Names a config file that replaces the defaults.
pub const CONFIG_PATH_VAR: &str = "NJ_SDWA_CONFIG";
/// Overrides [`SourceEndpoints::echo_url`].
pub const ECHO_URL_VAR: &str = "ECHO_QUERY_URL";
/// Overrides [`SourceEndpoints::ej_db_path`].
pub const EJ_DB_PATH_VAR: &str = "EJ_DB_PATH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Limits on what counts as a usable region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionLimits {
    /// Drawn regions must be smaller than this many square degrees.
    pub max_area: f64,
    /// Map bounds are only accepted at or above this zoom.
    pub min_zoom: u8,
    /// Default search radius around a dropped marker.
    pub point_radius_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// State whose systems are loaded.
    pub state: String,
    /// Fiscal year treated as currently operating.
    pub fiscal_year: i32,
    pub limits: RegionLimits,
    pub sources: SourceEndpoints,
}

impl Default for DashboardConfig {
    /// # Panics
    ///
    /// Panics if the embedded default TOML is malformed, which the tests
    /// rule out.
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML)
            .unwrap_or_else(|e| panic!("Embedded default config is invalid: {e}"))
    }
}

impl DashboardConfig {
    /// Loads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// * If `NJ_SDWA_CONFIG` names a file that cannot be read or parsed
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Reads a config file with the same layout as the defaults.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If the contents are not a valid config
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loading config from {}", path.display());
        Ok(toml::from_str(&contents)?)
    }

    /// Applies single-field overrides. `var` looks a variable up by name.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ECHO_URL_VAR).filter(|v| !v.is_empty()) {
            log::debug!("{ECHO_URL_VAR} override: {url}");
            self.sources.echo_url = url;
        }
        if let Some(path) = var(EJ_DB_PATH_VAR).filter(|v| !v.is_empty()) {
            log::debug!("{EJ_DB_PATH_VAR} override: {path}");
            self.sources.ej_db_path = PathBuf::from(path);
        }
    }

    /// Default search radius around a point, in meters.
    #[must_use]
    pub fn point_radius_m(&self) -> f64 {
        self.limits.point_radius_km * 1000.0
    }
}
