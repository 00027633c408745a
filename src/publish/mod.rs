//! Naming-record publishing
//!
//! The coalescer forwards the latest root identifier to a mutable naming
//! record. A newer identifier cancels whatever publish is still running, so
//! only the most recent one is guaranteed to land.

mod coalescer;
mod ipns;

pub use coalescer::{PublishCoalescer, PublishOutcome};
pub use ipns::IpnsPublisher;

use crate::error::PublishError;
use async_trait::async_trait;

/// Naming-record capability
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Whether a record named `name` exists and can be published to.
    async fn key_exists(&self, name: &str) -> Result<bool, PublishError>;

    /// Point `name` at `root`. Dropping the future abandons the publish.
    async fn publish(&self, name: &str, root: &str) -> Result<(), PublishError>;
}
