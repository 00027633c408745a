//! Configuration sources, applied in declaration order.

pub mod environment;
pub mod global_file;
pub mod workspace_file;
