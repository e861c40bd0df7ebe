//! Generator tunables
//!
//! `GeneratorConfig` carries every knob the schema compiler reads. Defaults
//! cover the common case; a YAML file can override any subset of them and
//! the CLI can override the file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::error::{Error, Result};

/// Bounds applied to every guarded walk over a possibly cyclic schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardLimits {
    /// Maximum descent depth before a walk is aborted
    pub max_depth: usize,
    /// Maximum number of visited nodes per walk
    pub max_nodes: usize,
    /// Wall-clock budget per walk, in milliseconds
    pub timeout_ms: u64,
}

impl GuardLimits {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for GuardLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_nodes: 100_000,
            timeout_ms: 10_000,
        }
    }
}

/// Configuration for a single generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Media types read from request bodies and responses, in preference order
    pub accepted_mime_types: Vec<String>,
    /// HTTP status codes treated as a successful response, in preference order
    pub success_codes: Vec<u16>,
    /// Echo identifier fields into the spec schema
    pub include_identifiers_in_spec: bool,
    /// Recursion guard limits
    pub guard: GuardLimits,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            accepted_mime_types: vec!["application/json".to_string()],
            success_codes: vec![200, 201],
            include_identifiers_in_spec: true,
            guard: GuardLimits::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from YAML (JSON is accepted as a YAML subset)
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Reject configurations the compiler cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.accepted_mime_types.is_empty() {
            return Err(Error::config("acceptedMimeTypes must not be empty"));
        }
        if self.success_codes.is_empty() {
            return Err(Error::config("successCodes must not be empty"));
        }
        if self.guard.max_depth == 0 || self.guard.max_nodes == 0 {
            return Err(Error::config("guard limits must be greater than zero"));
        }
        Ok(())
    }

    /// Whether `status` (as written in the document) is an accepted success code
    pub fn is_success_code(&self, status: &str) -> bool {
        status
            .parse::<u16>()
            .map(|code| self.success_codes.contains(&code))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.accepted_mime_types, vec!["application/json"]);
        assert_eq!(config.success_codes, vec![200, 201]);
        assert!(config.include_identifiers_in_spec);
        assert_eq!(config.guard.max_depth, 64);
        assert_eq!(config.guard.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = GeneratorConfig::from_yaml_str(
            "includeIdentifiersInSpec: false\nguard:\n  maxDepth: 8\n",
        )
        .unwrap();
        assert!(!config.include_identifiers_in_spec);
        assert_eq!(config.guard.max_depth, 8);
        assert_eq!(config.guard.max_nodes, 100_000);
        assert_eq!(config.success_codes, vec![200, 201]);
    }

    #[test]
    fn test_empty_mime_types_rejected() {
        let result = GeneratorConfig::from_yaml_str("acceptedMimeTypes: []\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_is_success_code() {
        let config = GeneratorConfig::default();
        assert!(config.is_success_code("200"));
        assert!(config.is_success_code("201"));
        assert!(!config.is_success_code("404"));
        assert!(!config.is_success_code("default"));
        assert!(!config.is_success_code("2XX"));
    }
}
