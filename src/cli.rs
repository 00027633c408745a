//! CLI domain: parse, run context, and output mapping.

mod output;
mod parse;
mod route;

pub use output::map_error;
pub use parse::Cli;
pub use route::{resolve_directory, RunContext};
