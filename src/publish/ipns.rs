//! IPNS publishing through the `ipfs` binary.

use super::Publisher;
use crate::error::PublishError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Publishes to IPNS keys with `ipfs name publish`.
#[derive(Debug, Clone)]
pub struct IpnsPublisher {
    binary: PathBuf,
}

impl Default for IpnsPublisher {
    fn default() -> Self {
        Self::new("ipfs")
    }
}

impl IpnsPublisher {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn exec(&self, args: &[String]) -> Result<String, PublishError> {
        let command = format!("{} {}", self.binary.display(), args.join(" "));
        debug!(command = %command, "Exec");

        // kill_on_drop: a cancelled publish must not leave the subprocess behind.
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| PublishError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(PublishError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Whether `name` appears as a whole token in `ipfs key list -l` output.
pub(crate) fn key_listed(listing: &str, name: &str) -> bool {
    !name.is_empty()
        && listing
            .lines()
            .flat_map(|line| line.split_whitespace())
            .any(|token| token == name)
}

#[async_trait]
impl Publisher for IpnsPublisher {
    async fn key_exists(&self, name: &str) -> Result<bool, PublishError> {
        let args = ["key", "list", "-l"].map(String::from);
        let listing = self
            .exec(&args)
            .await
            .map_err(|e| PublishError::KeyListFailed(e.to_string()))?;
        Ok(key_listed(&listing, name))
    }

    async fn publish(&self, name: &str, root: &str) -> Result<(), PublishError> {
        let args = vec![
            "name".to_string(),
            "publish".to_string(),
            format!("--key={}", name),
            root.to_string(),
        ];
        self.exec(&args).await.map(|_| ())
    }
}
