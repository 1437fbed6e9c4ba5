//! Structured error types for fraudboard-core.
//!
//! Every retrieval boundary returns `Result<T, DashboardError>`. Callers that
//! render something for a human match on [`DashboardError::kind`] instead of
//! parsing messages.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse error classification for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection string missing or malformed
    Configuration,
    /// Database unreachable when the pool was created
    Connection,
    /// A query failed to execute or decode
    DataRetrieval,
    /// Demo fixture could not be loaded
    Fixture,
}

/// Main error type for fraudboard-core operations
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Missing or invalid configuration
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Database could not be reached while creating the pool
    #[error("Could not connect to the database: {source}")]
    Connection {
        #[source]
        source: sqlx::Error,
    },

    /// Query execution or row decoding failed
    #[error("Failed to retrieve {query}: {source}")]
    DataRetrieval {
        query: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Query exceeded the configured timeout
    #[error("Timed out retrieving {query} after {seconds}s")]
    Timeout { query: &'static str, seconds: u64 },

    /// Fixture file unreadable or malformed
    #[error("Invalid fixture {path:?}: {reason}")]
    Fixture { path: PathBuf, reason: String },
}

/// Result type alias for fraudboard-core operations
pub type Result<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Wrap a driver error raised while running `query`
    pub fn retrieval(query: &'static str, source: sqlx::Error) -> Self {
        Self::DataRetrieval { query, source }
    }

    /// Create a fixture error
    pub fn fixture(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Fixture {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Classify the error. Timeouts count as retrieval failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::DataRetrieval { .. } | Self::Timeout { .. } => ErrorKind::DataRetrieval,
            Self::Fixture { .. } => ErrorKind::Fixture,
        }
    }
}
