//! The synchronizer: owns the current root and the event-consumption loop.

use super::event::{ClassifiedEvent, EventKind, RawEvent};
use super::ops::Ops;
use super::path;
use crate::error::{SyncError, WatchError};
use crate::ignore::IgnoreFilter;
use crate::store::{AddOptions, ContentStore};
use crate::watch::{NotificationSource, Subscription};
use crossbeam_channel::{bounded, never, select, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// What the loop does when the events buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Delivery {
    /// Wait for the consumer (back-pressure).
    #[default]
    Block,
    /// Drop the identifier that does not fit and keep going.
    DropNewest,
}

/// Synchronizer options
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Options for every `add` call, also the source of the ignore rules.
    pub add: AddOptions,
    /// Capacity of the events buffer (at least 1).
    pub events_buffer: usize,
    /// Full-buffer policy.
    pub delivery: Delivery,
    /// Watch subdirectories too.
    pub recursive: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            add: AddOptions::default(),
            events_buffer: 1,
            delivery: Delivery::Block,
            recursive: true,
        }
    }
}

/// Mirrors a directory into the content store and tracks its root identifier.
///
/// Construction ingests the whole tree once; afterwards a single background
/// thread applies one notification at a time until [`Synchronizer::close`].
pub struct Synchronizer {
    path: PathBuf,
    hash: Arc<RwLock<String>>,
    events_rx: Receiver<String>,
    events_wanted: Arc<AtomicBool>,
    source: Box<dyn NotificationSource>,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Synchronizer {
    /// Start synchronizing `path`.
    ///
    /// The subscription is opened before the initial ingestion so changes made
    /// while the tree is being added are replayed afterwards.
    pub fn watch(
        path: impl Into<PathBuf>,
        options: SyncOptions,
        store: Arc<dyn ContentStore>,
        filter: Arc<dyn IgnoreFilter>,
        mut source: Box<dyn NotificationSource>,
    ) -> Result<Self, SyncError> {
        let path = path.into();
        let subscription = source.subscribe(&path, options.recursive)?;

        let initial = match store.add(&path, &options.add) {
            Ok(hash) => hash,
            Err(source_err) => {
                let _ = source.unsubscribe();
                return Err(SyncError::InitialIngestionFailed {
                    path,
                    source: source_err,
                });
            }
        };
        info!(path = %path.display(), root = %initial, "Initial ingestion complete");

        let hash = Arc::new(RwLock::new(initial.clone()));
        let (events_tx, events_rx) = bounded(options.events_buffer.max(1));
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let events_wanted = Arc::new(AtomicBool::new(false));

        let event_loop = EventLoop {
            base: path::normalize_base(&path),
            ops: Ops::new(path.clone(), options.add.clone(), store),
            filter,
            current: initial,
            hash: Arc::clone(&hash),
            events_tx,
            events_wanted: Arc::clone(&events_wanted),
            delivery: options.delivery,
            stop_rx,
        };

        let thread = std::thread::Builder::new()
            .name("ipfs-sync-events".to_string())
            .spawn(move || event_loop.run(subscription));
        let thread = match thread {
            Ok(thread) => thread,
            Err(e) => {
                let _ = source.unsubscribe();
                return Err(SyncError::Io(e));
            }
        };

        Ok(Self {
            path,
            hash,
            events_rx,
            events_wanted,
            source,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// The synchronized directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current root identifier. May lag the loop by one event.
    pub fn hash(&self) -> String {
        self.hash.read().clone()
    }

    /// Stream of new root identifiers, one per net change, in mutation order.
    ///
    /// Every call returns a handle to the same stream; identifiers are only
    /// queued once this has been called.
    pub fn events(&self) -> Receiver<String> {
        self.events_wanted.store(true, Ordering::SeqCst);
        self.events_rx.clone()
    }

    /// Tear down the subscription and stop the loop.
    ///
    /// An event already being applied finishes first. Calling twice is a no-op.
    pub fn close(&mut self) -> Result<(), SyncError> {
        let Some(stop_tx) = self.stop_tx.take() else {
            return Ok(());
        };
        let unsubscribed = self.source.unsubscribe();
        drop(stop_tx);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Event loop thread panicked");
            }
        }
        debug!(path = %self.path.display(), "Synchronizer closed");
        unsubscribed.map_err(SyncError::from)
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Error closing synchronizer: {}", e);
        }
    }
}

/// State owned by the consumption thread. `current` has no other writer.
struct EventLoop {
    base: String,
    ops: Ops,
    filter: Arc<dyn IgnoreFilter>,
    current: String,
    hash: Arc<RwLock<String>>,
    events_tx: Sender<String>,
    events_wanted: Arc<AtomicBool>,
    delivery: Delivery,
    stop_rx: Receiver<()>,
}

impl EventLoop {
    fn run(mut self, subscription: Subscription) {
        let events = subscription.events;
        let mut errors = subscription.errors;
        let stop_rx = self.stop_rx.clone();

        loop {
            let mut errors_closed = false;
            select! {
                recv(stop_rx) -> _ => break,
                recv(events) -> msg => match msg {
                    Ok(raw) => self.handle(raw),
                    Err(_) => {
                        debug!("Event channel closed");
                        break;
                    }
                },
                recv(errors) -> msg => match msg {
                    Ok(err) => self.handle_watch_error(err),
                    Err(_) => errors_closed = true,
                },
            }
            if errors_closed {
                errors = never();
            }
        }
    }

    fn handle_watch_error(&self, err: WatchError) {
        warn!("Watch error: {}", err);
    }

    fn handle(&mut self, raw: RawEvent) {
        let path = path::normalize(&self.base, &raw.path);
        if path.is_empty() {
            trace!(raw = %raw.path.display(), "Event for base directory skipped");
            return;
        }
        if self.filter.matches(&path) {
            trace!(path = %path, "Ignored");
            return;
        }

        let kind = EventKind::classify(raw.flags);
        debug!(root = %self.current, path = %path, kind = %kind, "File event");
        let event = ClassifiedEvent { path, kind };

        match self.ops.translate(&self.current, &event) {
            Ok(next) => {
                if next.is_empty() || next == self.current {
                    return;
                }
                self.current = next.clone();
                *self.hash.write() = next.clone();
                info!(root = %next, path = %event.path, kind = %event.kind, "Root updated");
                self.emit(next);
            }
            Err(e @ SyncError::UnknownEventKind { .. }) => {
                warn!(flags = ?raw.flags, "{}", e);
            }
            Err(e) => {
                error!(path = %event.path, kind = %event.kind, "error: {}", e);
            }
        }
    }

    fn emit(&self, hash: String) {
        if !self.events_wanted.load(Ordering::SeqCst) {
            return;
        }
        match self.delivery {
            Delivery::Block => {
                select! {
                    send(self.events_tx, hash) -> res => {
                        if res.is_err() {
                            trace!("Events receiver dropped");
                        }
                    },
                    recv(self.stop_rx) -> _ => {
                        debug!("Closed while delivering identifier");
                    },
                }
            }
            Delivery::DropNewest => match self.events_tx.try_send(hash) {
                Ok(()) => {}
                Err(TrySendError::Full(hash)) => {
                    warn!(root = %hash, "Events buffer full, identifier dropped");
                }
                Err(TrySendError::Disconnected(_)) => {
                    trace!("Events receiver dropped");
                }
            },
        }
    }
}
