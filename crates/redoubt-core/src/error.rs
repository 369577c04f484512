//! Core error types for redoubt-core.
//!
//! This module defines the error hierarchy using thiserror. Engine
//! operations return typed errors; callers surface them directly without
//! automatic retry, except database errors on polling reads, which are
//! transient and retried on the next tick.

use std::path::PathBuf;

use chrono::NaiveTime;
use thiserror::Error;

/// Core error type for redoubt-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A focus session is already active and not preemptable.
    #[error("a focus session is already active: '{name}'")]
    SessionConflict { name: String },

    /// Cancellation of a hardcore session attempted without a verified
    /// master-password override.
    #[error("hardcore session is locked until natural expiry")]
    HardcoreLocked,

    /// Master password verification failed; state is unchanged.
    #[error("master password verification failed")]
    InvalidPassword,

    /// Unknown schedule id
    #[error("schedule not found: {0}")]
    ScheduleNotFound(String),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to resolve the data directory
    #[error("failed to resolve data directory: {0}")]
    DataDir(String),

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Master password too short
    #[error("master password must be at least {min} characters")]
    WeakPassword { min: usize },

    /// Schedule window start and end coincide
    #[error("schedule window start ({start}) must differ from end ({end})")]
    EmptyWindow { start: NaiveTime, end: NaiveTime },

    /// Enabled schedule without any weekday
    #[error("an enabled schedule needs at least one weekday")]
    NoWeekdays,

    /// Invalid value
    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

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
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
