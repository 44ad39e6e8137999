//! Checker configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CheckerError, Result};

/// How probes are scheduled within a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStrategy {
    /// Consecutive fixed-size chunks; a chunk waits for its slowest probe
    /// before the next one starts. One progress report per chunk.
    #[default]
    Chunked,
    /// Semaphore-bounded pool; a finished probe frees its slot immediately.
    /// Progress is reported every `concurrency_bound` completions.
    Pool,
}

impl std::str::FromStr for ScheduleStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "chunked" => Ok(ScheduleStrategy::Chunked),
            "pool" => Ok(ScheduleStrategy::Pool),
            _ => Err(format!("Invalid schedule strategy: {}", s)),
        }
    }
}

/// Configuration for a checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Maximum number of probes outstanding at once
    pub concurrency_bound: usize,

    /// Base URL of the profile picture service; probes hit
    /// `{base}/{id}/picture?type=normal`
    pub remote_endpoint_base: String,

    /// Substring of the final (post-redirect) URL that marks a placeholder
    pub dead_marker: String,

    /// Timeout for each probe in milliseconds
    pub timeout_ms: u64,

    /// Maximum number of non-blank input lines accepted per run
    pub max_ids_per_run: usize,

    /// Scheduling strategy
    pub strategy: ScheduleStrategy,

    /// Report transport failures as `Unreachable` instead of `Dead`
    pub distinguish_unreachable: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            concurrency_bound: 10,
            remote_endpoint_base: "https://graph.facebook.com".to_string(),
            dead_marker: "static".to_string(),
            timeout_ms: 10_000,
            max_ids_per_run: 10_000,
            strategy: ScheduleStrategy::Chunked,
            distinguish_unreachable: false,
        }
    }
}

impl CheckerConfig {
    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: CheckerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency_bound == 0 {
            return Err(CheckerError::InvalidConfig(
                "concurrency_bound must be greater than zero".to_string(),
            ));
        }
        if self.max_ids_per_run == 0 {
            return Err(CheckerError::InvalidConfig(
                "max_ids_per_run must be greater than zero".to_string(),
            ));
        }
        if self.remote_endpoint_base.trim().is_empty() {
            return Err(CheckerError::InvalidConfig(
                "remote_endpoint_base must not be empty".to_string(),
            ));
        }
        if self.dead_marker.is_empty() {
            return Err(CheckerError::InvalidConfig(
                "dead_marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CheckerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.concurrency_bound, 10);
        assert_eq!(config.dead_marker, "static");
        assert_eq!(config.strategy, ScheduleStrategy::Chunked);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CheckerConfig::from_toml_str(
            r#"
            concurrency_bound = 50
            strategy = "pool"
            "#,
        )
        .unwrap();

        assert_eq!(config.concurrency_bound, 50);
        assert_eq!(config.strategy, ScheduleStrategy::Pool);
        assert_eq!(config.timeout_ms, 10_000);
        assert!(!config.distinguish_unreachable);
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let err = CheckerConfig::from_toml_str("concurrency_bound = 0").unwrap_err();
        assert!(matches!(err, CheckerError::InvalidConfig(_)));
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let err = CheckerConfig::from_toml_str("strategy = \"sideways\"").unwrap_err();
        assert!(matches!(err, CheckerError::ConfigParse(_)));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("pool".parse::<ScheduleStrategy>(), Ok(ScheduleStrategy::Pool));
        assert!("fast".parse::<ScheduleStrategy>().is_err());
    }
}
