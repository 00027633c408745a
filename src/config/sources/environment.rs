//! Environment source: IPFS_SYNC_<KEY>, nested keys joined with `__`.
//!
//! `IPFS_SYNC_IGNORE` takes a comma-separated list.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("IPFS_SYNC")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("ignore"),
    )
}
