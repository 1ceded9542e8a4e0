//! # chanio
//!
//! Cursor-managed byte windows and channel-style endpoints.
//!
//! chanio moves bytes between files, pipes and memory through a
//! [`ByteWindow`]: a fixed block of bytes with `mark`, `position`, `limit`
//! and `capacity` cursors. Endpoints read into and write from windows; the
//! transfer engine drives read/flip/write/clear cycles between them.
//!
//! ## Features
//!
//! - **Byte windows**: bounds-checked put/get with flip, clear, rewind,
//!   mark and reset
//! - **Endpoints**: files, one-way OS pipes and in-memory arrays, with
//!   scatter reads and gather writes
//! - **Transfers**: buffered copy, direct file-to-file transfer
//!   (`copy_file_range` on Linux) and memory-mapped copy
//!
//! ```
//! use chanio::{ByteWindow, MemoryEndpoint, transfer};
//!
//! let mut source = MemoryEndpoint::from_bytes(b"abcdef".to_vec());
//! let mut sink = MemoryEndpoint::sink();
//! let mut window = ByteWindow::allocate(4);
//! let report = transfer::copy(&mut source, &mut sink, &mut window).unwrap();
//! assert_eq!(report.cycles, 2);
//! assert_eq!(sink.contents(), b"abcdef");
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory mapping (memmap2) and copy_file_range
#![warn(unsafe_code)]

pub mod cli;
pub mod core;
pub mod endpoint;
pub mod error;
pub mod transfer;

// Re-export commonly used types at crate root
pub use error::{CommandError, EndpointError, Error, Result, TransferError, WindowError};

// Re-export core types
pub use core::{ByteWindow, WindowSnapshot};

// Re-export endpoint types
pub use endpoint::{
    Endpoint, FileEndpoint, MemoryEndpoint, OpenMode, PipeSink, PipeSource, ReadStatus,
    close_all, pipe,
};

// Re-export transfer types
pub use transfer::{
    DEFAULT_WINDOW_SIZE, Strategy, TransferReport, copy_file, copy_mapped, transfer_fully,
};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
