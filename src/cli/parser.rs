//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::transfer::DEFAULT_WINDOW_SIZE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chanio: move bytes between files, pipes and memory through
/// cursor-managed windows.
#[derive(Parser, Debug)]
#[command(name = "chanio")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true, env = "CHANIO_FORMAT")]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy a file with the chosen transfer strategy.
    Copy {
        /// Source file.
        src: PathBuf,

        /// Destination file (created or truncated).
        dst: PathBuf,

        /// Transfer strategy (buffered, direct, mapped).
        #[arg(short, long, default_value = "buffered")]
        strategy: String,

        /// Window capacity in bytes for buffered copies.
        #[arg(short, long, default_value_t = DEFAULT_WINDOW_SIZE, env = "CHANIO_WINDOW_SIZE")]
        window_size: usize,
    },

    /// Scatter-read a file into several windows, then gather-write them.
    ///
    /// Performs a single pass: only the first sum-of-capacities bytes are
    /// moved.
    Scatter {
        /// Source file.
        src: PathBuf,

        /// Destination file (created or truncated).
        dst: PathBuf,

        /// Comma-separated window capacities, filled in order.
        #[arg(short = 'W', long, value_delimiter = ',', default_value = "100,1024")]
        windows: Vec<usize>,
    },

    /// Send a message through a one-way OS pipe and read it back.
    Pipe {
        /// Message to send.
        message: String,

        /// Window capacity in bytes.
        #[arg(short, long, default_value_t = DEFAULT_WINDOW_SIZE)]
        capacity: usize,
    },

    /// Walk a window through put/flip/get/mark/reset/rewind/clear and show
    /// its cursors after each step.
    Inspect {
        /// Text to put into the window.
        text: String,

        /// Window capacity in bytes.
        #[arg(short, long, default_value_t = DEFAULT_WINDOW_SIZE)]
        capacity: usize,
    },
}
