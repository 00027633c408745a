//! ipfs-sync CLI Binary
//!
//! Mirrors a directory into IPFS and prints the root hash on every change.

use clap::Parser;
use ipfs_sync::cli::{Cli, RunContext};
use ipfs_sync::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let context = match RunContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}", ipfs_sync::cli::map_error(&e));
            process::exit(1);
        }
    };

    if cli.print_config {
        match context.render_config() {
            Ok(rendered) => {
                print!("{}", rendered);
                return;
            }
            Err(e) => {
                eprintln!("{}", ipfs_sync::cli::map_error(&e));
                process::exit(1);
            }
        }
    }

    let logging_config = build_logging_config(&cli, &context.config().logging);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("ipfs-sync starting");

    if let Err(e) = context.execute() {
        error!("Synchronization failed: {}", e);
        eprintln!("{}", ipfs_sync::cli::map_error(&e));
        process::exit(1);
    }
}

/// Build logging configuration from CLI args and config file.
/// Logging stays off unless --verbose is given; explicit flags override the file.
fn build_logging_config(cli: &Cli, file_config: &LoggingConfig) -> LoggingConfig {
    let mut config = file_config.clone();
    if !cli.verbose {
        config.enabled = false;
        return config;
    }

    config.enabled = true;
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }
    config
}
