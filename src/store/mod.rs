//! Content Store
//!
//! The content-addressed store the synchronizer mutates. Calls are synchronous
//! and the engine never issues two of them concurrently against one root.

pub mod shell;

pub use shell::IpfsShell;

use crate::error::StoreError;
use std::path::{Path, PathBuf};

/// Options passed to every `add` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Paths (relative to the synchronized directory) to leave out.
    pub ignore_paths: Vec<String>,
    /// Gitignore-style rules file honoured by the store.
    pub ignore_rules_path: Option<PathBuf>,
    /// Include files and directories whose names start with `.`.
    pub include_hidden: bool,
}

/// Content-store capability
pub trait ContentStore: Send + Sync {
    /// Ingest a file or directory tree and return its content hash.
    fn add(&self, path: &Path, options: &AddOptions) -> Result<String, StoreError>;

    /// Link `hash` under `root` at `path`, returning the new root.
    fn add_link(&self, root: &str, path: &str, hash: &str) -> Result<String, StoreError>;

    /// Remove the link at `path` under `root`, returning the new root.
    fn remove_link(&self, root: &str, path: &str) -> Result<String, StoreError>;
}
