//! Error types for chanio operations.
//!
//! This module provides the error hierarchy using `thiserror` for window
//! cursor violations, endpoint failures, transfer engine failures and CLI
//! commands.

use thiserror::Error;

/// Result type alias for chanio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for chanio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Cursor-bounds violations on a [`ByteWindow`](crate::ByteWindow).
    #[error("window error: {0}")]
    Window(#[from] WindowError),

    /// Endpoint failures (closed, I/O, mode, direction).
    #[error("endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    /// Transfer engine failures.
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),
}

/// Cursor violations raised by [`ByteWindow`](crate::ByteWindow).
///
/// Every variant is raised before any cursor moves.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// A put would write past `limit`.
    #[error("buffer overflow: {requested} bytes requested, {remaining} remaining")]
    Overflow {
        /// Bytes the caller tried to write.
        requested: usize,
        /// Bytes available between position and limit.
        remaining: usize,
    },

    /// A get would read past `limit`.
    #[error("buffer underflow: {requested} bytes requested, {remaining} remaining")]
    Underflow {
        /// Bytes the caller tried to read.
        requested: usize,
        /// Bytes available between position and limit.
        remaining: usize,
    },

    /// `reset()` called while no mark is set.
    #[error("invalid mark: reset called without a mark")]
    InvalidMark,

    /// An absolute cursor or slice index falls outside its allowed range.
    #[error("{what} {index} out of bounds (max {max})")]
    OutOfBounds {
        /// Which cursor or index was rejected.
        what: &'static str,
        /// The rejected value.
        index: usize,
        /// Largest accepted value.
        max: usize,
    },
}

/// Errors raised by endpoints.
#[derive(Error, Debug)]
pub enum EndpointError {
    /// Operation on an endpoint that has already been closed.
    #[error("endpoint closed: {endpoint}")]
    Closed {
        /// Endpoint description.
        endpoint: String,
    },

    /// Underlying resource failure (disk full, broken pipe, permission).
    #[error("I/O failure on {endpoint}: {source}")]
    Io {
        /// Endpoint description.
        endpoint: String,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// Unsupported combination of open flags.
    #[error("invalid open mode: {mode}")]
    InvalidMode {
        /// Rendered mode flags.
        mode: String,
    },

    /// The endpoint does not support this direction.
    #[error("unsupported operation: {operation} on {endpoint}")]
    UnsupportedOperation {
        /// Operation name.
        operation: &'static str,
        /// Endpoint description.
        endpoint: String,
    },
}

/// Errors raised by the transfer engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The engine was handed a window with no capacity.
    #[error("transfer window has zero capacity")]
    EmptyWindow,

    /// The sink accepted no bytes while data was pending.
    #[error("sink stalled with {pending} bytes pending")]
    SinkStalled {
        /// Bytes still waiting in the window.
        pending: usize,
    },

    /// A source is too large to map into this address space.
    #[error("source of {size} bytes cannot be mapped")]
    SizeMismatch {
        /// Source size in bytes.
        size: u64,
    },
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

impl EndpointError {
    /// Wraps an OS error with the endpoint it happened on.
    pub fn io(endpoint: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Returns the OS error kind when this is an I/O failure.
    #[must_use]
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Endpoint(EndpointError::io("unknown", err))
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        Self::ExecutionFailed(format!("serialization failed: {err}"))
    }
}
