//! ipfs-sync: Incremental Directory Mirroring into IPFS
//!
//! Watches a directory, turns every filesystem notification into link-graph
//! mutations against a single evolving root hash, and streams each new root.
//! The latest root can optionally be published to an IPNS key.

pub mod cli;
pub mod config;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod publish;
pub mod store;
pub mod sync;
pub mod watch;
