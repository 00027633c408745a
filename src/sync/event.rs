//! Raw notifications and their classification.

use bitflags::bitflags;
use std::fmt;
use std::path::PathBuf;

bitflags! {
    /// Flags carried by a raw filesystem notification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u8 {
        const CREATE = 1 << 0;
        const WRITE = 1 << 1;
        const REMOVE = 1 << 2;
        const RENAME = 1 << 3;
        const CHMOD = 1 << 4;
    }
}

/// Notification as delivered by the source: platform separators, possibly absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub flags: EventFlags,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, flags: EventFlags) -> Self {
        Self {
            path: path.into(),
            flags,
        }
    }
}

/// The closed set of event kinds the translator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Create,
    Remove,
    Write,
    Rename,
    Chmod,
    Unknown,
}

/// Classification order: the first flag present wins.
pub const CLASSIFY_PRECEDENCE: [(EventFlags, EventKind); 5] = [
    (EventFlags::CREATE, EventKind::Create),
    (EventFlags::REMOVE, EventKind::Remove),
    (EventFlags::WRITE, EventKind::Write),
    (EventFlags::RENAME, EventKind::Rename),
    (EventFlags::CHMOD, EventKind::Chmod),
];

impl EventKind {
    /// Map a flag set to exactly one kind.
    pub fn classify(flags: EventFlags) -> Self {
        CLASSIFY_PRECEDENCE
            .iter()
            .find(|(flag, _)| flags.contains(*flag))
            .map(|(_, kind)| *kind)
            .unwrap_or(EventKind::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Create => "Create",
            EventKind::Remove => "Remove",
            EventKind::Write => "Write",
            EventKind::Rename => "Rename",
            EventKind::Chmod => "Chmod",
            EventKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized, classified event ready for translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub path: String,
    pub kind: EventKind,
}
