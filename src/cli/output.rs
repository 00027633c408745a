//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::SyncError;

/// Map domain errors to the message printed before exiting.
pub fn map_error(e: &SyncError) -> String {
    match e {
        SyncError::InitialIngestionFailed { .. } => format!("Error: watch: {}", e),
        SyncError::PublishSetupFailed(_) => format!("Publish error: {}", e),
        SyncError::ConfigError(_) => format!("Error: config: {}", e),
        _ => format!("Error: {}", e),
    }
}
