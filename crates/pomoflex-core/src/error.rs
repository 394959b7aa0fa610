//! Core error types for pomoflex-core.
//!
//! Every fallible operation in the engine returns [`CoreError`]. Storage and
//! configuration failures have their own enums so callers can match on the
//! cause without parsing messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::TimerState;

/// Core error type for pomoflex-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Writing the snapshot failed. The in-memory state is still valid.
    ///
    /// Only [`TimerContext::save`](crate::TimerContext::save) returns this;
    /// the automatic save after each operation reports it as an event.
    #[error("Storage write failed: {0}")]
    StorageWrite(#[from] StorageError),

    /// A persisted document could not be read back.
    #[error("Corrupted data under '{key}': {reason}")]
    StorageReadCorruption { key: String, reason: String },

    /// An action was requested that the current state does not allow.
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: TimerState,
    },

    /// A supplied configuration was rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No open or just-closed reflection session to attach a summary to.
    #[error("No reflection session to attach a summary to")]
    NoReflectionTarget,

    /// Reflection summaries must contain text.
    #[error("Reflection summary is empty")]
    EmptyReflection,
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The store refused the write because it is full.
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    /// Failed to create the data directory or open the store file
    #[error("Failed to open store at {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// Snapshot document could not be serialized
    #[error("Failed to serialize '{key}': {message}")]
    Serialize { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
