//! Error types for the viewer engine.
//!
//! None of these escape as panics: navigation errors are swallowed by the
//! controller, persistence errors trigger a rollback and configuration errors
//! are returned to whoever loads the configuration.

use std::time::Duration;
use thiserror::Error;

/// Rejected page-number input from the toolbar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("'{0}' is not a page number")]
    NotANumber(String),

    #[error("page {page} is outside 1..={page_count}")]
    OutOfRange { page: usize, page_count: usize },
}

/// Failure reported for a rotation save
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The document service refused the new angle
    #[error("rotation rejected: {0}")]
    Rejected(String),

    /// The request never reached the document service
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rotation save timed out after {0:?}")]
    TimedOut(Duration),
}

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O error when reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value parsed but cannot be used
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
