//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order; the first file that exists wins:
//! 1. `$<APP>_CONFIG` if set (`CMDHOST_CONFIG` for the `cmdhost` binary)
//! 2. `$XDG_CONFIG_HOME/<app>/config.toml`
//! 3. `~/.<app>/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use cmdhost::core::config::Config;
//!
//! let result = Config::load("cmdhost").unwrap();
//! println!("log level: {}", result.config.host.logging.level);
//! ```

pub mod schema;

pub use schema::{HostConfig, RuntimeConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Loaded configuration and where it came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Host settings
    pub host: HostConfig,
    /// Path to the config file (if one was loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration for `app` from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load(app: &str) -> Result<ConfigLoadResult, ConfigError> {
        for path in Self::locations(app) {
            if path.exists() {
                let host = Self::read(&path)?;
                return Ok(ConfigLoadResult {
                    config: Config {
                        host,
                        path: Some(path),
                    },
                });
            }
        }

        Ok(ConfigLoadResult {
            config: Config::default(),
        })
    }

    /// Candidate config file paths for `app`, highest precedence first.
    pub fn locations(app: &str) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = std::env::var(Self::env_var(app)) {
            paths.push(PathBuf::from(path));
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join(app).join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{}", app)).join("config.toml"));
        }

        paths
    }

    /// Environment variable naming an explicit config file for `app`.
    pub fn env_var(app: &str) -> String {
        format!("{}_CONFIG", app.to_uppercase().replace('-', "_"))
    }

    /// Read, parse and validate one config file.
    pub fn read(path: &Path) -> Result<HostConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: HostConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the path of the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
