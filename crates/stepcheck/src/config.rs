//! Configuration.
//!
//! ```yaml
//! poll:
//!   timeout_ms: 5000
//!   poll_interval_ms: 100
//!   max_attempts: 0   # 0 = unlimited within the timeout
//! ```

use crate::result::{StepcheckError, StepcheckResult};
use crate::wait::{PollConfig, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Poll budget for availability checks, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Stop polling after this many milliseconds
    pub timeout_ms: u64,
    /// Delay between attempts
    pub poll_interval_ms: u64,
    /// Maximum attempts (0 = unlimited within the timeout)
    pub max_attempts: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_attempts: 0,
        }
    }
}

impl PollSettings {
    /// Convert to a runtime poll budget
    #[must_use]
    pub const fn to_poll_config(&self) -> PollConfig {
        PollConfig::new(Duration::from_millis(self.timeout_ms))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_max_attempts(self.max_attempts)
    }
}

impl From<PollSettings> for PollConfig {
    fn from(settings: PollSettings) -> Self {
        settings.to_poll_config()
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepcheckConfig {
    /// Visibility poll budget
    pub poll: PollSettings,
}

impl StepcheckConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poll timeout
    #[must_use]
    pub const fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.poll.timeout_ms = ms;
        self
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll.poll_interval_ms = ms;
        self
    }

    /// Set the maximum number of attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, max: usize) -> Self {
        self.poll.max_attempts = max;
        self
    }

    /// Runtime poll budget
    #[must_use]
    pub const fn poll_config(&self) -> PollConfig {
        self.poll.to_poll_config()
    }

    /// Parse a configuration from YAML.
    ///
    /// # Errors
    /// Returns error if the YAML is malformed or the settings are inconsistent.
    pub fn from_yaml_str(yaml: &str) -> StepcheckResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> StepcheckResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> StepcheckResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check the settings for consistency.
    ///
    /// # Errors
    /// Returns [`StepcheckError::Config`] if the poll interval exceeds a
    /// non-zero timeout.
    pub fn validate(&self) -> StepcheckResult<()> {
        let poll = &self.poll;
        if poll.timeout_ms > 0 && poll.poll_interval_ms > poll.timeout_ms {
            return Err(StepcheckError::Config {
                message: format!(
                    "poll_interval_ms ({}) exceeds timeout_ms ({})",
                    poll.poll_interval_ms, poll.timeout_ms
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_default_matches_poller() {
            let config = StepcheckConfig::default();
            assert_eq!(config.poll_config(), PollConfig::default());
        }

        #[test]
        fn test_builder() {
            let config = StepcheckConfig::new()
                .with_timeout_ms(250)
                .with_poll_interval_ms(25)
                .with_max_attempts(4);
            let poll = config.poll_config();
            assert_eq!(poll.timeout, Duration::from_millis(250));
            assert_eq!(poll.poll_interval, Duration::from_millis(25));
            assert_eq!(poll.max_attempts, 4);
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = StepcheckConfig::from_yaml_str("poll:\n  timeout_ms: 1500\n").unwrap();
            assert_eq!(config.poll.timeout_ms, 1500);
            assert_eq!(config.poll.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
            assert_eq!(config.poll.max_attempts, 0);
        }

        #[test]
        fn test_empty_mapping() {
            let config = StepcheckConfig::from_yaml_str("{}").unwrap();
            assert_eq!(config, StepcheckConfig::default());
        }

        #[test]
        fn test_malformed_yaml() {
            let err = StepcheckConfig::from_yaml_str("poll: [1, 2").unwrap_err();
            assert!(matches!(err, StepcheckError::Yaml(_)));
        }

        #[test]
        fn test_interval_longer_than_timeout_rejected() {
            let yaml = "poll:\n  timeout_ms: 50\n  poll_interval_ms: 100\n";
            let err = StepcheckConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, StepcheckError::Config { .. }));
        }

        #[test]
        fn test_yaml_round_trip() {
            let config = StepcheckConfig::new().with_max_attempts(9);
            let yaml = config.to_yaml().unwrap();
            assert_eq!(StepcheckConfig::from_yaml_str(&yaml).unwrap(), config);
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn test_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "poll:\n  poll_interval_ms: 20\n  max_attempts: 3").unwrap();
            let config = StepcheckConfig::from_file(file.path()).unwrap();
            assert_eq!(config.poll.poll_interval_ms, 20);
            assert_eq!(config.poll.max_attempts, 3);
        }

        #[test]
        fn test_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let err = StepcheckConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
            assert!(matches!(err, StepcheckError::Io(_)));
        }
    }
}
