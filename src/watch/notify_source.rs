//! `notify`-backed notification source.

use super::{NotificationSource, Subscription};
use crate::error::WatchError;
use crate::sync::{EventFlags, RawEvent};
use crossbeam_channel::{unbounded, Sender};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tracing::{debug, error};

/// Notification source built on the platform's recommended watcher.
#[derive(Default)]
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
}

impl NotifySource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationSource for NotifySource {
    fn subscribe(&mut self, dir: &Path, recursive: bool) -> Result<Subscription, WatchError> {
        let (events_tx, events_rx) = unbounded();
        let (errors_tx, errors_rx) = unbounded();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            forward(res, &events_tx, &errors_tx);
        })
        .map_err(|e| WatchError::InitFailed {
            reason: e.to_string(),
        })?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(dir, mode)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        debug!(dir = %dir.display(), recursive, "Subscribed");
        self.watcher = Some(watcher);

        Ok(Subscription {
            events: events_rx,
            errors: errors_rx,
        })
    }

    fn unsubscribe(&mut self) -> Result<(), WatchError> {
        // Dropping the watcher drops the callback and with it both senders.
        if self.watcher.take().is_some() {
            debug!("Unsubscribed");
        }
        Ok(())
    }
}

fn forward(res: notify::Result<Event>, events: &Sender<RawEvent>, errors: &Sender<WatchError>) {
    match res {
        Ok(event) => {
            for raw in raw_events(&event) {
                if events.send(raw).is_err() {
                    return;
                }
            }
        }
        Err(e) => {
            if let Err(send_err) = errors.send(WatchError::from(e)) {
                error!("Error sending watch error: {}", send_err);
            }
        }
    }
}

/// Split a `notify` event into per-path raw events.
///
/// A rename reported with both ends becomes a `RENAME` for the old path and a
/// `CREATE` for the new one. Access events are dropped.
pub fn raw_events(event: &Event) -> Vec<RawEvent> {
    let flags = match event.kind {
        EventKind::Access(_) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut out = Vec::with_capacity(2);
            if let Some(from) = event.paths.first() {
                out.push(RawEvent::new(from.clone(), EventFlags::RENAME));
            }
            if let Some(to) = event.paths.get(1) {
                out.push(RawEvent::new(to.clone(), EventFlags::CREATE));
            }
            return out;
        }
        EventKind::Create(_) => EventFlags::CREATE,
        EventKind::Remove(_) => EventFlags::REMOVE,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => EventFlags::CREATE,
        EventKind::Modify(ModifyKind::Name(_)) => EventFlags::RENAME,
        EventKind::Modify(ModifyKind::Metadata(_)) => EventFlags::CHMOD,
        EventKind::Modify(_) => EventFlags::WRITE,
        EventKind::Any | EventKind::Other => EventFlags::empty(),
    };

    event
        .paths
        .iter()
        .map(|path| RawEvent::new(path.clone(), flags))
        .collect()
}
