//! Ignore rules for watch events.
//!
//! The filter is compiled once when the synchronizer starts and is read-only
//! afterwards. Three sources feed it:
//!
//! - an explicit path list, matching the path itself and everything below it,
//! - an optional gitignore-syntax rules file (usually the workspace `.gitignore`),
//! - hidden-file exclusion, unless hidden files are included.
//!
//! The same inputs are forwarded to the content store as [`AddOptions`], so the
//! initial ingestion and the incremental updates agree on what is excluded.

use crate::error::SyncError;
use crate::store::AddOptions;
use ::ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory always ignored in git mode.
pub const GIT_DIR: &str = ".git";

/// Rules file picked up in git mode when none is configured.
pub const GITIGNORE_FILE: &str = ".gitignore";

/// Path-matching capability consulted before an event is classified.
pub trait IgnoreFilter: Send + Sync {
    /// True when `path` (store-relative, forward slashes) must be dropped.
    fn matches(&self, path: &str) -> bool;
}

/// Compiled ignore rules for one synchronized directory.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: PathBuf,
    paths: Vec<String>,
    gitignore: Gitignore,
    include_hidden: bool,
}

impl IgnoreRules {
    /// A filter that matches nothing.
    pub fn none() -> Self {
        Self {
            root: PathBuf::new(),
            paths: Vec::new(),
            gitignore: Gitignore::empty(),
            include_hidden: true,
        }
    }

    /// Compile rules rooted at `root` from the given add options.
    pub fn compile(root: &Path, options: &AddOptions) -> Result<Self, SyncError> {
        let gitignore = match &options.ignore_rules_path {
            Some(rules_path) => {
                let rules_path = resolve_rules_path(root, rules_path);
                let mut builder = GitignoreBuilder::new(root);
                if let Some(err) = builder.add(&rules_path) {
                    return Err(SyncError::ConfigError(format!(
                        "Failed to read ignore rules {}: {}",
                        rules_path.display(),
                        err
                    )));
                }
                let gitignore = builder.build().map_err(|e| {
                    SyncError::ConfigError(format!(
                        "Invalid ignore rules {}: {}",
                        rules_path.display(),
                        e
                    ))
                })?;
                debug!(rules = %rules_path.display(), count = gitignore.num_ignores(), "Loaded ignore rules");
                gitignore
            }
            None => Gitignore::empty(),
        };

        let paths = options
            .ignore_paths
            .iter()
            .map(|p| p.replace('\\', "/").trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();

        Ok(Self {
            root: root.to_path_buf(),
            paths,
            gitignore,
            include_hidden: options.include_hidden,
        })
    }

    fn matches_explicit(&self, path: &str) -> bool {
        self.paths.iter().any(|ignored| {
            path == ignored
                || path
                    .strip_prefix(ignored.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    fn matches_hidden(&self, path: &str) -> bool {
        !self.include_hidden
            && path
                .split('/')
                .any(|component| component.starts_with('.') && component.len() > 1 && component != "..")
    }

    fn matches_rules(&self, path: &str) -> bool {
        // The matcher panics on rooted paths.
        let path = path.trim_start_matches('/');
        if self.gitignore.is_empty() || path.is_empty() {
            return false;
        }
        let is_dir = self.root.join(path).is_dir();
        if self
            .gitignore
            .matched_path_or_any_parents(path, is_dir)
            .is_ignore()
        {
            return true;
        }
        // A removed directory no longer stats as one; directory-only rules
        // must still cover its Remove event.
        !is_dir
            && self
                .gitignore
                .matched_path_or_any_parents(path, true)
                .is_ignore()
    }
}

impl IgnoreFilter for IgnoreRules {
    fn matches(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        self.matches_explicit(path) || self.matches_hidden(path) || self.matches_rules(path)
    }
}

/// Resolve a rules file against the synchronized directory.
pub(crate) fn resolve_rules_path(root: &Path, rules_path: &Path) -> PathBuf {
    if rules_path.is_absolute() {
        rules_path.to_path_buf()
    } else {
        root.join(rules_path)
    }
}

/// Apply git mode: when the workspace has a `.gitignore` and no rules file was
/// chosen, use it, and always skip the `.git` directory.
pub fn apply_git_defaults(root: &Path, options: &mut AddOptions) {
    if !root.join(GITIGNORE_FILE).is_file() {
        return;
    }
    if options.ignore_rules_path.is_none() {
        options.ignore_rules_path = Some(root.join(GITIGNORE_FILE));
    }
    if !options.ignore_paths.iter().any(|p| p == GIT_DIR) {
        options.ignore_paths.push(GIT_DIR.to_string());
    }
}
