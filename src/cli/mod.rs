//! CLI layer for chanio.
//!
//! Provides the command-line interface using clap, with commands for
//! copying files, scatter/gather, pipes and cursor inspection.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
