//! logging
//!
//! Structured logging for the host and the commands it runs.
//!
//! # Overview
//!
//! Built on `tracing`. Events go to stderr so a command's own output on
//! stdout stays clean.
//!
//! # Precedence
//!
//! Highest first:
//! 1. `CMDHOST_LOG` (a full `EnvFilter` directive string)
//! 2. `CMDHOST_LOG_FORMAT` (`text` or `json`)
//! 3. The `[logging]` table of the config file
//! 4. Defaults (`warn`, text, colored)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable holding a filter directive that overrides the config.
pub const LOG_ENV: &str = "CMDHOST_LOG";

/// Environment variable overriding the output format.
pub const LOG_FORMAT_ENV: &str = "CMDHOST_LOG_FORMAT";

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const FORMATS: &[&str] = &["text", "json"];

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level '{0}', must be one of: trace, debug, info, warn, error, off")]
    InvalidLevel(String),

    #[error("invalid log format '{0}', must be one of: text, json")]
    InvalidFormat(String),

    #[error("invalid log directive '{directive}': {message}")]
    InvalidDirective { directive: String, message: String },
}

/// Logging configuration.
///
/// # Example
///
/// ```toml
/// [logging]
/// level = "info"
/// format = "json"
/// color = false
///
/// [logging.modules]
/// "cmdhost::engine" = "debug"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format: text, json
    #[serde(default = "default_format")]
    pub format: String,

    /// Colored output (text format only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Check level, format and module directives.
    pub fn validate(&self) -> Result<(), LoggingError> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }
        if !FORMATS.contains(&self.format.as_str()) {
            return Err(LoggingError::InvalidFormat(self.format.clone()));
        }
        for (module, level) in &self.modules {
            if !LEVELS.contains(&level.as_str()) {
                return Err(LoggingError::InvalidDirective {
                    directive: format!("{}={}", module, level),
                    message: "unknown level".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Install the global subscriber.
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let base = Registry::default().with(filter);

    let installed = if format == "json" {
        base.with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .try_init()
    } else {
        base.with(
            fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(config.color)
                .with_writer(std::io::stderr),
        )
        .try_init()
    };

    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
    }
    Ok(())
}

/// Filter from `CMDHOST_LOG`, or from the config level plus module levels.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }

    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();
    for (module, level) in modules {
        let directive = format!("{}={}", module, level);
        let parsed = directive
            .parse::<Directive>()
            .map_err(|e| LoggingError::InvalidDirective {
                directive: directive.clone(),
                message: e.to_string(),
            })?;
        filter = filter.add_directive(parsed);
    }
    Ok(filter)
}

/// Output format, with `CMDHOST_LOG_FORMAT` taking precedence.
fn determine_format(config: &LoggingConfig) -> Result<String, LoggingError> {
    let format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| config.format.clone());
    if FORMATS.contains(&format.as_str()) {
        Ok(format)
    } else {
        Err(LoggingError::InvalidFormat(format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, "text");
        assert!(config.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_table_fills_defaults() {
        let config: LoggingConfig = toml::from_str("level = \"debug\"").unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, "text");
    }

    #[test]
    fn invalid_values_rejected() {
        let config = LoggingConfig {
            level: "loud".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LoggingError::InvalidLevel(_))));

        let config = LoggingConfig {
            format: "xml".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LoggingError::InvalidFormat(_))));

        let mut config = LoggingConfig::default();
        config.modules.insert("cmdhost::engine".into(), "chatty".into());
        assert!(matches!(
            config.validate(),
            Err(LoggingError::InvalidDirective { .. })
        ));
    }

    #[test]
    fn module_directives_build() {
        let mut config = LoggingConfig::default();
        config.modules.insert("cmdhost::engine".into(), "debug".into());
        assert!(build_env_filter(&config).is_ok());
    }

    #[test]
    fn init_twice_is_harmless() {
        let config = LoggingConfig {
            level: "off".into(),
            ..Default::default()
        };
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }
}
