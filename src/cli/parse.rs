//! CLI parse: clap types for ipfs-sync. No behavior; definitions only.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// ipfs-sync - Mirror a directory into IPFS and print its root hash on every change
#[derive(Parser, Debug)]
#[command(name = "ipfs-sync", version)]
#[command(about = "Mirror a directory into IPFS and print its root hash on every change")]
pub struct Cli {
    /// Directory to synchronize
    pub directory: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Print logs to stderr
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// IPNS publish key or name
    #[arg(long)]
    pub ipns_key: Option<String>,

    /// Ignore files from .gitignore and the .git directory itself
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    pub git: Option<bool>,

    /// Path to ignore (repeatable)
    #[arg(long = "ignore", value_name = "PATH")]
    pub ignore: Vec<String>,

    /// Gitignore-syntax rules file
    #[arg(long)]
    pub ignore_rules_path: Option<PathBuf>,

    /// Include files that are hidden
    #[arg(long)]
    pub hidden: bool,

    /// ipfs executable
    #[arg(long)]
    pub ipfs_binary: Option<PathBuf>,

    /// Capacity of the root hash stream
    #[arg(long)]
    pub events_buffer: Option<usize>,

    /// Full-buffer policy for the root hash stream
    #[arg(long, value_parser = ["block", "drop-newest"])]
    pub delivery: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
