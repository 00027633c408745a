//! Event-to-mutation translation.
//!
//! Each classified event turns into at most two content-store calls against
//! the current root. A failed call leaves the root where it was.

use super::event::{ClassifiedEvent, EventKind};
use crate::error::SyncError;
use crate::store::{AddOptions, ContentStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// A link-graph mutation issued against the current root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    AddLink { path: String, hash: String },
    RemoveLink { path: String },
}

/// Translates classified events into content-store mutations.
pub struct Ops {
    base: PathBuf,
    options: AddOptions,
    store: Arc<dyn ContentStore>,
}

impl Ops {
    pub fn new(base: PathBuf, options: AddOptions, store: Arc<dyn ContentStore>) -> Self {
        Self {
            base,
            options,
            store,
        }
    }

    pub fn options(&self) -> &AddOptions {
        &self.options
    }

    /// Apply `event` to `last` and return the resulting root.
    ///
    /// On error the caller keeps `last`; nothing here retries.
    pub fn translate(&self, last: &str, event: &ClassifiedEvent) -> Result<String, SyncError> {
        match event.kind {
            EventKind::Create | EventKind::Write => self.upsert(last, &event.path),
            // A rename only unlinks the old name; the new name arrives as a Create.
            EventKind::Remove | EventKind::Rename => self.apply(
                last,
                Mutation::RemoveLink {
                    path: event.path.clone(),
                },
            ),
            EventKind::Chmod => Ok(last.to_string()),
            EventKind::Unknown => Err(SyncError::UnknownEventKind {
                path: event.path.clone(),
            }),
        }
    }

    fn upsert(&self, last: &str, path: &str) -> Result<String, SyncError> {
        let hash = self.store.add(&self.base.join(path), &self.options)?;
        self.apply(
            last,
            Mutation::AddLink {
                path: path.to_string(),
                hash,
            },
        )
    }

    /// Issue a single mutation against `last`.
    pub fn apply(&self, last: &str, mutation: Mutation) -> Result<String, SyncError> {
        debug!(root = %last, mutation = ?mutation, "Applying mutation");
        let next = match &mutation {
            Mutation::AddLink { path, hash } => self.store.add_link(last, path, hash)?,
            Mutation::RemoveLink { path } => self.store.remove_link(last, path)?,
        };
        Ok(next)
    }
}
