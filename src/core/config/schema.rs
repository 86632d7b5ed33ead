//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing; unknown keys are rejected while
//! parsing.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::logging::LoggingConfig;

/// Host configuration.
///
/// # Example
///
/// ```toml
/// [logging]
/// level = "info"
/// format = "text"
///
/// [runtime]
/// cancel_on_interrupt = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Logging settings
    pub logging: LoggingConfig,

    /// Dispatch settings
    pub runtime: RuntimeConfig,
}

impl HostConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging
            .validate()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }
}

/// Runtime behavior of the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Cancel the running invocation on Ctrl-C (default: true)
    pub cancel_on_interrupt: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cancel_on_interrupt: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config: HostConfig = toml::from_str("").unwrap();
        assert_eq!(config, HostConfig::default());
        assert!(config.runtime.cancel_on_interrupt);
    }

    #[test]
    fn parse_full() {
        let config: HostConfig = toml::from_str(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [runtime]
            cancel_on_interrupt = false
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert!(!config.runtime.cancel_on_interrupt);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<HostConfig, _> = toml::from_str("[plugins]\nenabled = true");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_level_fails_validation() {
        let config: HostConfig = toml::from_str("[logging]\nlevel = \"loud\"").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
