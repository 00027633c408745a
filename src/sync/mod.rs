//! Directory synchronization engine
//!
//! Turns raw filesystem notifications into ordered content-store mutations
//! against a single evolving root identifier.
//!
//! ```text
//! NotificationSource -> normalize -> IgnoreFilter -> classify -> Ops -> root
//!                                                                     |
//!                                                              events() stream
//! ```

pub mod event;
pub mod ops;
pub mod path;
mod synchronizer;

pub use event::{ClassifiedEvent, EventFlags, EventKind, RawEvent, CLASSIFY_PRECEDENCE};
pub use ops::{Mutation, Ops};
pub use synchronizer::{Delivery, SyncOptions, Synchronizer};
