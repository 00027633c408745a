//! Latest-wins publish loop.

use super::Publisher;
use crate::error::{PublishError, SyncError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// How a single publish attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(String),
    Cancelled(String),
    Failed(String),
}

/// Drives a naming record towards the most recent root identifier.
///
/// At most one publish runs at a time. Each attempt owns a cancellation token;
/// a newer identifier cancels it and waits for the attempt to wind down
/// before the next one starts.
pub struct PublishCoalescer {
    name: String,
    tx: mpsc::UnboundedSender<String>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl PublishCoalescer {
    /// Check that `name` exists, then start the publish loop on the current runtime.
    pub async fn start(publisher: Arc<dyn Publisher>, name: impl Into<String>) -> Result<Self, SyncError> {
        let name = name.into();
        match publisher.key_exists(&name).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(SyncError::PublishSetupFailed(PublishError::KeyNotFound(name)));
            }
            Err(e) => return Err(SyncError::PublishSetupFailed(e)),
        }
        info!(key = %name, "Publishing to key");

        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(run(publisher, name.clone(), rx, shutdown.clone()));

        Ok(Self {
            name,
            tx,
            shutdown,
            task,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `root` for publishing. Never blocks.
    pub fn submit(&self, root: impl Into<String>) {
        let root = root.into();
        if root.is_empty() {
            return;
        }
        if self.tx.send(root).is_err() {
            debug!("Publish loop already stopped");
        }
    }

    /// Stop accepting identifiers and let the current publish finish.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            error!("Publish loop failed: {}", e);
        }
    }

    /// Cancel the current publish and stop.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!("Publish loop failed: {}", e);
        }
    }
}

async fn run(
    publisher: Arc<dyn Publisher>,
    name: String,
    mut rx: mpsc::UnboundedReceiver<String>,
    shutdown: CancellationToken,
) {
    let mut inflight: Option<(CancellationToken, JoinHandle<PublishOutcome>)> = None;

    loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => None,
            msg = rx.recv() => msg,
        };
        let Some(mut latest) = received else {
            break;
        };

        while let Ok(newer) = rx.try_recv() {
            debug!(root = %latest, "Superseded before publish");
            latest = newer;
        }

        if let Some((token, handle)) = inflight.take() {
            token.cancel();
            let _ = handle.await;
        }

        let token = shutdown.child_token();
        let handle = tokio::spawn(attempt(
            Arc::clone(&publisher),
            name.clone(),
            latest,
            token.clone(),
        ));
        inflight = Some((token, handle));
    }

    // A closed channel lets the last publish complete; shutdown cancels it.
    if let Some((_, handle)) = inflight.take() {
        let _ = handle.await;
    }
}

async fn attempt(
    publisher: Arc<dyn Publisher>,
    name: String,
    root: String,
    token: CancellationToken,
) -> PublishOutcome {
    debug!(key = %name, root = %root, "Publish started");
    tokio::select! {
        _ = token.cancelled() => {
            debug!(key = %name, root = %root, "Publish cancelled");
            PublishOutcome::Cancelled(root)
        }
        res = publisher.publish(&name, &root) => match res {
            Ok(()) => {
                info!(key = %name, root = %root, "Published");
                PublishOutcome::Published(root)
            }
            Err(e) => {
                error!(key = %name, root = %root, "{}", SyncError::PublishCallFailed(e));
                PublishOutcome::Failed(root)
            }
        }
    }
}
