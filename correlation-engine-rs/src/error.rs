//! Error handling for the correlation engine
//!
//! The analysis path itself never fails: missing fields, unparsable documents
//! and empty matches all resolve to documented fallback values. Errors only
//! arise when an extractor is built from an invalid configuration.

use thiserror::Error;

/// Result type for correlation engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the correlation engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Invalid extractor configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        EngineError::Configuration(message.into())
    }
}
