//! Configuration System
//!
//! Layered configuration for the synchronizer. Sources, lowest precedence first:
//! built-in defaults, the global config file, the workspace `.ipfs-sync.toml`,
//! then `IPFS_SYNC_*` environment variables. Command-line flags are applied
//! on top by the binary.

use crate::error::SyncError;
use crate::ignore;
use crate::logging::LoggingConfig;
use crate::store::AddOptions;
use crate::sync::{Delivery, SyncOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge_policy;
mod sources;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// `ipfs` executable used for store and publish calls
    #[serde(default = "default_ipfs_binary")]
    pub ipfs_binary: PathBuf,

    /// Paths (relative to the synchronized directory) to ignore
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Gitignore-syntax rules file
    #[serde(default)]
    pub ignore_rules_path: Option<PathBuf>,

    /// Include hidden files
    #[serde(default)]
    pub include_hidden: bool,

    /// Honour the workspace .gitignore and skip .git
    #[serde(default = "default_true")]
    pub git: bool,

    /// IPNS key to publish the latest root to
    #[serde(default)]
    pub ipns_key: Option<String>,

    /// Capacity of the root identifier stream
    #[serde(default = "default_events_buffer")]
    pub events_buffer: usize,

    /// Full-buffer policy for the identifier stream
    #[serde(default)]
    pub delivery: Delivery,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_ipfs_binary() -> PathBuf {
    PathBuf::from("ipfs")
}

fn default_true() -> bool {
    true
}

fn default_events_buffer() -> usize {
    1
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ipfs_binary: default_ipfs_binary(),
            ignore: Vec::new(),
            ignore_rules_path: None,
            include_hidden: false,
            git: default_true(),
            ipns_key: None,
            events_buffer: default_events_buffer(),
            delivery: Delivery::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SyncError> {
        let mut errors = Vec::new();
        if self.ipfs_binary.as_os_str().is_empty() {
            errors.push("ipfs_binary cannot be empty".to_string());
        }
        if self.events_buffer == 0 {
            errors.push("events_buffer must be at least 1".to_string());
        }
        if matches!(&self.ipns_key, Some(key) if key.trim().is_empty()) {
            errors.push("ipns_key cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SyncError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )))
        }
    }

    /// Options for content-store `add` calls in `root`, git mode applied.
    ///
    /// A relative rules path is resolved against `root`, the same file the
    /// event filter loads.
    pub fn add_options(&self, root: &Path) -> AddOptions {
        let mut options = AddOptions {
            ignore_paths: self.ignore.clone(),
            ignore_rules_path: self
                .ignore_rules_path
                .as_deref()
                .map(|rules| ignore::resolve_rules_path(root, rules)),
            include_hidden: self.include_hidden,
        };
        if self.git {
            ignore::apply_git_defaults(root, &mut options);
        }
        options
    }

    /// Synchronizer options for `root`.
    pub fn sync_options(&self, root: &Path) -> SyncOptions {
        SyncOptions {
            add: self.add_options(root),
            events_buffer: self.events_buffer,
            delivery: self.delivery,
            recursive: true,
        }
    }
}

/// Loads [`SyncConfig`] from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace directory.
    pub fn load(workspace_root: &Path) -> Result<SyncConfig, SyncError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder);
        let config: SyncConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from one explicit file (plus defaults and environment).
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, SyncError> {
        if !path.is_file() {
            return Err(SyncError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()).required(true));
        let builder = sources::environment::add_to_builder(builder);
        let config: SyncConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
