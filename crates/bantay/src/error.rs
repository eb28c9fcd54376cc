//! Error types for the aggregation engine.
//!
//! The taxonomy keeps fetch failures distinct from legitimately empty
//! results: a store that errors must never look like a store with zero
//! residents. "No active event" and offline degradation are modeled as
//! ordinary values elsewhere, not as errors.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for aggregation operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Store fetch failures ===
    /// The registry store (residents, centers, events) failed.
    #[error("registry fetch failed: {message}")]
    RegistryFetch {
        /// Human-readable description of the failure.
        message: String,
    },

    /// The status log store failed.
    #[error("status log fetch failed: {message}")]
    LogFetch {
        /// Human-readable description of the failure.
        message: String,
    },

    /// A log row carried a timestamp that does not parse as RFC 3339.
    ///
    /// The whole batch fails closed; a mis-ordered reduction would silently
    /// report the wrong status.
    #[error("unparseable status log timestamp {value:?} for resident {resident_id}")]
    InvalidTimestamp {
        /// Resident the offending row belongs to.
        resident_id: String,
        /// The raw timestamp value.
        value: String,
    },

    // === Fallback cache errors ===
    /// Failed to open or create the fallback cache database.
    #[error("failed to open fallback cache at {path}: {source}")]
    CacheOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A fallback cache query failed.
    #[error("fallback cache query failed: {0}")]
    CacheQuery(#[from] rusqlite::Error),

    /// Failed to run fallback cache migrations.
    #[error("fallback cache migration failed: {message}")]
    CacheMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a registry fetch failure.
    #[must_use]
    pub fn registry_fetch(message: impl Into<String>) -> Self {
        Self::RegistryFetch {
            message: message.into(),
        }
    }

    /// Create a status log fetch failure.
    #[must_use]
    pub fn log_fetch(message: impl Into<String>) -> Self {
        Self::LogFetch {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error came from a store fetch (registry or log).
    ///
    /// Callers use this to present "backend unreachable" distinctly from
    /// every other failure mode.
    #[must_use]
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::RegistryFetch { .. } | Self::LogFetch { .. } | Self::InvalidTimestamp { .. }
        )
    }
}
