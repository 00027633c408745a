//! Error types for the directory synchronizer and its collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Content-store call errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("`{command}` exited with {status}: {stderr:?}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` returned no identifier")]
    InvalidOutput { command: String },
}

/// Notification source errors
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("File system event error: {details}")]
    EventError { details: String },
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::EventError {
            details: e.to_string(),
        }
    }
}

/// Naming-record publish errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Key {0} doesn't exist")]
    KeyNotFound(String),

    #[error("Failed to list keys: {0}")]
    KeyListFailed(String),

    #[error("`{command}` exited with {status}: {stderr:?}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Engine-level errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Initial ingestion of {path} failed: {source}")]
    InitialIngestionFailed {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("Content store call failed: {0}")]
    ContentStoreCallFailed(#[from] StoreError),

    #[error("Unknown event kind for {path:?}")]
    UnknownEventKind { path: String },

    #[error("Watcher error: {0}")]
    Watcher(#[from] WatchError),

    #[error("Publish setup failed: {0}")]
    PublishSetupFailed(#[source] PublishError),

    #[error("Publish failed: {0}")]
    PublishCallFailed(#[source] PublishError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::ConfigError(err.to_string())
    }
}
