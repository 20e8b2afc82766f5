//! Result and error types for stepcheck.
//!
//! Assertion outcomes are not errors: a failed comparison or a missing element
//! is reported as [`AssertionOutcome::Fail`](crate::AssertionOutcome). The
//! variants here describe collaborator failures (which the evaluators convert
//! into FAIL) and construction-time problems such as an ambiguous step.

use thiserror::Error;

/// Result type for stepcheck operations
pub type StepcheckResult<T> = Result<T, StepcheckError>;

/// Errors that can occur in stepcheck
#[derive(Debug, Error)]
pub enum StepcheckError {
    /// A page script raised or could not be delivered
    #[error("Script '{script}' failed: {message}")]
    ScriptFailed {
        /// Name of the page script
        script: String,
        /// Error message
        message: String,
    },

    /// No element could be obtained for a located target
    #[error("Element not found: {target}")]
    ElementNotFound {
        /// Target identifier returned by the element finder
        target: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A test step's arguments do not describe exactly one check
    #[error("Invalid assertion step: {message}")]
    InvalidStep {
        /// Error message
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl StepcheckError {
    /// Build a [`StepcheckError::InvalidStep`]
    pub fn invalid_step(message: impl Into<String>) -> Self {
        Self::InvalidStep {
            message: message.into(),
        }
    }

    /// Build a [`StepcheckError::ScriptFailed`]
    pub fn script_failed(script: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScriptFailed {
            script: script.into(),
            message: message.into(),
        }
    }
}
