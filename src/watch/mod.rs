//! Notification sources
//!
//! A source runs on its own thread and feeds two channels into the
//! synchronizer: one for raw change events, one for watcher errors.

mod notify_source;

pub use notify_source::{raw_events, NotifySource};

use crate::error::WatchError;
use crate::sync::RawEvent;
use crossbeam_channel::Receiver;
use std::path::Path;

/// Receiving ends of a subscription. Both close when the source unsubscribes.
pub struct Subscription {
    pub events: Receiver<RawEvent>,
    pub errors: Receiver<WatchError>,
}

/// Filesystem notification capability
pub trait NotificationSource: Send {
    /// Start delivering notifications for `dir`.
    fn subscribe(&mut self, dir: &Path, recursive: bool) -> Result<Subscription, WatchError>;

    /// Stop delivering notifications and close the subscription channels.
    fn unsubscribe(&mut self) -> Result<(), WatchError>;
}
