//! `ipfs` command-line adapter

use super::{AddOptions, ContentStore};
use crate::error::StoreError;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Content store backed by the `ipfs` binary.
#[derive(Debug, Clone)]
pub struct IpfsShell {
    binary: PathBuf,
}

impl Default for IpfsShell {
    fn default() -> Self {
        Self::new("ipfs")
    }
}

impl IpfsShell {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Check that the binary can be executed at all.
    pub fn ensure_available(&self) -> Result<(), StoreError> {
        self.exec(&["version".to_string()]).map(|_| ())
    }

    /// Run the binary with `args`, returning trimmed stdout.
    pub fn exec(&self, args: &[String]) -> Result<String, StoreError> {
        let command = format!("{} {}", self.binary.display(), args.join(" "));
        debug!(command = %command, "Exec");

        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|source| StoreError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(StoreError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn exec_hash(&self, args: &[String]) -> Result<String, StoreError> {
        let hash = self.exec(args)?;
        if hash.is_empty() {
            return Err(StoreError::InvalidOutput {
                command: format!("{} {}", self.binary.display(), args.join(" ")),
            });
        }
        Ok(hash)
    }
}

/// Arguments for `ipfs add`.
pub fn add_args(path: &Path, options: &AddOptions) -> Vec<String> {
    let mut args: Vec<String> = ["add", "-Q", "-r"].iter().map(|s| s.to_string()).collect();
    if options.include_hidden {
        args.push("-H".to_string());
    }
    if let Some(rules) = &options.ignore_rules_path {
        args.push(format!("--ignore-rules-path={}", rules.display()));
    }
    for ignored in &options.ignore_paths {
        args.push(format!("--ignore={}", ignored));
    }
    args.push(path.to_string_lossy().to_string());
    args
}

impl ContentStore for IpfsShell {
    fn add(&self, path: &Path, options: &AddOptions) -> Result<String, StoreError> {
        self.exec_hash(&add_args(path, options))
    }

    fn add_link(&self, root: &str, path: &str, hash: &str) -> Result<String, StoreError> {
        let args: Vec<String> = ["object", "patch", "add-link", root, path, hash]
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.exec_hash(&args)
    }

    fn remove_link(&self, root: &str, path: &str) -> Result<String, StoreError> {
        let args: Vec<String> = ["object", "patch", "rm-link", root, path]
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.exec_hash(&args)
    }
}
