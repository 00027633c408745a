//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("ipfs_binary", "ipfs")?
        .set_default("git", true)?
        .set_default("include_hidden", false)?
        .set_default("events_buffer", 1)?
        .set_default("delivery", "block")
}
