//! Core error types for agenda-core.
//!
//! This module defines the error hierarchy using thiserror so that
//! every fallible boundary (storage, extraction, validation, slot
//! search) surfaces a typed, matchable error.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for agenda-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Extraction-collaborator errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Slot-search errors
    #[error("Slot search error: {0}")]
    Slots(#[from] SlotError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),
}

/// Errors from the free-text extraction collaborator.
///
/// Both variants carry the original input so a caller (or a test) can
/// tell a genuine parse from a locally-recovered fallback.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The request to the extraction service failed outright.
    #[error("Extraction request failed for {text:?}: {message}")]
    RequestFailed { text: String, message: String },

    /// The service answered but the payload was unusable.
    #[error("Extraction returned an unusable response for {text:?}: {message}")]
    MalformedResponse { text: String, message: String },

    /// No API credentials configured for the extraction service.
    #[error("Extraction service credentials not configured ({env_var} unset)")]
    CredentialsNotConfigured { env_var: String },
}

impl ExtractionError {
    /// The raw input text the failed extraction was attempted on, if known.
    pub fn original_text(&self) -> Option<&str> {
        match self {
            Self::RequestFailed { text, .. } | Self::MalformedResponse { text, .. } => {
                Some(text.as_str())
            }
            Self::CredentialsNotConfigured { .. } => None,
        }
    }
}

/// Slot-search errors.
#[derive(Error, Debug)]
pub enum SlotError {
    /// The greedy scan hit the search horizon before collecting
    /// enough free slots.
    #[error("No free {duration_min}-minute slot found within {horizon_days} days")]
    HorizonExhausted {
        duration_min: i64,
        horizon_days: i64,
    },

    /// Guard against degenerate configurations (e.g. an empty
    /// business-hours window) that would otherwise spin forever.
    #[error("Slot search aborted after {iterations} iterations")]
    IterationLimit { iterations: u64 },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end_time ({end}) must be greater than start_time ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A partial update carried nothing to apply
    #[error("No fields provided for {operation}")]
    EmptyUpdate { operation: String },
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
