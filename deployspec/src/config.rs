//! Configuration for spec-building sessions.

use crate::errors::{Result, SpecError};
use crate::ids::IdStrategy;
use crate::logging::LoggingConfig;
use crate::spec::LATEST_SPEC_VERSION;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecConfig {
    /// Spec version stamped on the definition at init.
    #[serde(default = "default_spec_version")]
    pub spec_version: String,
    /// How vertex and stream ids are generated.
    #[serde(default)]
    pub id_strategy: IdStrategy,
    /// Whether function names are lowercased when added.
    #[serde(default = "default_lowercase_function_names")]
    pub lowercase_function_names: bool,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_spec_version() -> String {
    LATEST_SPEC_VERSION.to_string()
}

fn default_lowercase_function_names() -> bool {
    true
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            spec_version: default_spec_version(),
            id_strategy: IdStrategy::default(),
            lowercase_function_names: default_lowercase_function_names(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SpecConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Serialization`] on malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SpecError::Serialization(e.to_string()))
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Fails on IO errors or malformed JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Sets the spec version.
    #[must_use]
    pub fn with_spec_version(mut self, version: impl Into<String>) -> Self {
        self.spec_version = version.into();
        self
    }

    /// Sets the id strategy.
    #[must_use]
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// Sets whether function names are lowercased.
    #[must_use]
    pub fn with_lowercase_function_names(mut self, enabled: bool) -> Self {
        self.lowercase_function_names = enabled;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = SpecConfig::default();
        assert_eq!(config.spec_version, "v3");
        assert_eq!(config.id_strategy, IdStrategy::Uuid);
        assert!(config.lowercase_function_names);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SpecConfig::from_json_str(r#"{"id_strategy": "sequential"}"#).unwrap();
        assert_eq!(config.id_strategy, IdStrategy::Sequential);
        assert_eq!(config.spec_version, "v3");
        assert!(config.lowercase_function_names);
    }

    #[test]
    fn test_full_json() {
        let config = SpecConfig::from_json_str(
            r#"{
                "spec_version": "v2",
                "id_strategy": "uuid",
                "lowercase_function_names": false,
                "logging": {"level": "debug", "json": true}
            }"#,
        )
        .unwrap();

        let expected = SpecConfig::new()
            .with_spec_version("v2")
            .with_lowercase_function_names(false)
            .with_logging(LoggingConfig::new("debug").with_json(true));
        assert_eq!(config, expected);
    }

    #[test]
    fn test_malformed_json() {
        let err = SpecConfig::from_json_str("{").unwrap_err();
        assert_eq!(err.code(), "SPEC-501-SERIALIZATION");
    }

    #[test]
    fn test_missing_file() {
        let err = SpecConfig::from_file("/nonexistent/deployspec.json").unwrap_err();
        assert_eq!(err.code(), "SPEC-502-IO");
    }
}
