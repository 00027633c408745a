//! CLI route: run context. Wires the synchronizer, the identifier stream and
//! the optional publisher together.

use crate::cli::parse::Cli;
use crate::config::{ConfigLoader, SyncConfig};
use crate::error::SyncError;
use crate::ignore::IgnoreRules;
use crate::publish::{IpnsPublisher, PublishCoalescer, Publisher};
use crate::store::{ContentStore, IpfsShell};
use crate::sync::{Delivery, Synchronizer};
use crate::watch::{NotificationSource, NotifySource};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Runtime context for CLI execution: resolved directory and merged config.
pub struct RunContext {
    root: PathBuf,
    config: SyncConfig,
}

impl RunContext {
    /// Resolve the directory and load configuration, CLI flags taking precedence.
    pub fn new(cli: &Cli) -> Result<Self, SyncError> {
        let root = resolve_directory(&cli.directory)?;
        let mut config = if let Some(ref cfg_path) = cli.config {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&root)?
        };
        apply_overrides(&mut config, cli);
        config.validate()?;
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The merged configuration as TOML.
    pub fn render_config(&self) -> Result<String, SyncError> {
        toml::to_string_pretty(&self.config)
            .map_err(|e| SyncError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Run until the identifier stream ends.
    ///
    /// Prints the initial root, then every new root, one per line on stdout.
    pub fn execute(&self) -> Result<(), SyncError> {
        info!(path = %self.root.display(), "Starting");

        let shell = IpfsShell::new(&self.config.ipfs_binary);
        shell.ensure_available()?;

        let publisher = self
            .config
            .ipns_key
            .as_ref()
            .map(|_| Arc::new(IpnsPublisher::new(&self.config.ipfs_binary)) as Arc<dyn Publisher>);

        let mut stdout = std::io::stdout();
        self.run(
            Arc::new(shell),
            Box::new(NotifySource::new()),
            publisher,
            &mut stdout,
        )
    }

    /// Synchronize with the given collaborators, writing roots to `out`.
    ///
    /// The identifier stream is requested before anything else can block, so
    /// no root applied during publisher setup goes unprinted.
    pub fn run<W: Write>(
        &self,
        store: Arc<dyn ContentStore>,
        source: Box<dyn NotificationSource>,
        publisher: Option<Arc<dyn Publisher>>,
        out: &mut W,
    ) -> Result<(), SyncError> {
        let options = self.config.sync_options(&self.root);
        let filter = Arc::new(IgnoreRules::compile(&self.root, &options.add)?);
        let mut sync = Synchronizer::watch(&self.root, options, store, filter, source)?;
        let events = sync.events();

        let initial = sync.hash();
        print_root(out, &initial)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let coalescer = match (&self.config.ipns_key, publisher) {
            (Some(key), Some(publisher)) => {
                let coalescer = runtime.block_on(PublishCoalescer::start(publisher, key.clone()))?;
                coalescer.submit(initial);
                Some(coalescer)
            }
            _ => None,
        };

        for hash in events.iter() {
            print_root(out, &hash)?;
            if let Some(coalescer) = &coalescer {
                coalescer.submit(hash);
            }
        }

        if let Some(coalescer) = coalescer {
            runtime.block_on(coalescer.close());
        }
        sync.close()
    }
}

fn print_root<W: Write>(out: &mut W, hash: &str) -> Result<(), SyncError> {
    writeln!(out, "{}", hash)?;
    out.flush()?;
    Ok(())
}

/// Resolve `.` and relative paths to an absolute, existing directory.
pub fn resolve_directory(path: &Path) -> Result<PathBuf, SyncError> {
    let path = if path == Path::new(".") {
        std::env::current_dir()?
    } else {
        path.to_path_buf()
    };
    let resolved = dunce::canonicalize(&path).map_err(|e| {
        SyncError::ConfigError(format!("Cannot resolve {}: {}", path.display(), e))
    })?;
    if !resolved.is_dir() {
        return Err(SyncError::ConfigError(format!(
            "{} is not a directory",
            resolved.display()
        )));
    }
    Ok(resolved)
}

/// Apply command-line flags on top of loaded configuration.
pub(crate) fn apply_overrides(config: &mut SyncConfig, cli: &Cli) {
    if let Some(ref binary) = cli.ipfs_binary {
        config.ipfs_binary = binary.clone();
    }
    config.ignore.extend(cli.ignore.iter().cloned());
    if let Some(ref rules) = cli.ignore_rules_path {
        config.ignore_rules_path = Some(rules.clone());
    }
    if cli.hidden {
        config.include_hidden = true;
    }
    if let Some(git) = cli.git {
        config.git = git;
    }
    if let Some(ref key) = cli.ipns_key {
        config.ipns_key = Some(key.clone());
    }
    if let Some(buffer) = cli.events_buffer {
        config.events_buffer = buffer;
    }
    match cli.delivery.as_deref() {
        Some("drop-newest") => config.delivery = Delivery::DropNewest,
        Some("block") => config.delivery = Delivery::Block,
        _ => {}
    }
}
