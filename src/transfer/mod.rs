//! Transfer engine.
//!
//! Moves bytes between endpoints in three ways:
//!
//! - **Buffered** ([`copy`]): read/flip/write/clear cycles through one
//!   reusable [`ByteWindow`], for any pair of endpoints
//! - **Direct** ([`transfer`], [`transfer_fully`]): file-to-file without an
//!   application-visible window
//! - **Mapped** ([`copy_mapped`]): memory-maps both files and copies between
//!   the mappings
//!
//! [`copy_file`] opens two paths, runs one strategy and closes both files
//! on every exit path.

pub mod direct;
pub mod mapped;

pub use direct::{transfer, transfer_fully};
pub use mapped::copy_mapped;

use crate::core::ByteWindow;
use crate::endpoint::{Endpoint, FileEndpoint, OpenMode, ReadStatus, close_all};
use crate::error::{CommandError, Result, TransferError};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace, warn};

/// Default window capacity for buffered copies (1 KiB).
pub const DEFAULT_WINDOW_SIZE: usize = 1024;

/// How [`copy_file`] moves bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Read/flip/write/clear through a reusable window.
    #[default]
    Buffered,
    /// Endpoint-to-endpoint transfer (`copy_file_range` where available).
    Direct,
    /// Copy between memory mappings of both files.
    Mapped,
}

impl Strategy {
    /// Returns the strategy name as accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buffered => "buffered",
            Self::Direct => "direct",
            Self::Mapped => "mapped",
        }
    }

    /// Lists the accepted strategy names.
    #[must_use]
    pub const fn available() -> &'static [&'static str] {
        &["buffered", "direct", "mapped"]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = CommandError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buffered" | "channel" => Ok(Self::Buffered),
            "direct" => Ok(Self::Direct),
            "mapped" | "mmap" => Ok(Self::Mapped),
            other => Err(CommandError::InvalidArgument(format!(
                "unknown strategy '{other}' (expected one of: {})",
                Self::available().join(", ")
            ))),
        }
    }
}

/// Summary of a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    /// Strategy that moved the bytes.
    pub strategy: Strategy,
    /// Total bytes moved.
    pub bytes: u64,
    /// Number of cycles (or direct calls) that moved data.
    pub cycles: u64,
}

impl TransferReport {
    /// Creates an empty report for `strategy`.
    #[must_use]
    pub const fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            bytes: 0,
            cycles: 0,
        }
    }
}

/// Copies everything from `source` to `sink` through `window`.
///
/// Each cycle reads into the window, flips it, drains it into the sink and
/// clears it. The window is cleared before the first read, so it always
/// starts in write-mode.
///
/// # Errors
///
/// Returns [`TransferError::EmptyWindow`] for a zero-capacity window,
/// [`TransferError::SinkStalled`] if the sink accepts nothing while bytes
/// are pending, and any endpoint error from either side.
///
/// # Examples
///
/// ```
/// use chanio::{ByteWindow, MemoryEndpoint, transfer};
///
/// let mut source = MemoryEndpoint::from_bytes(vec![7u8; 2500]);
/// let mut sink = MemoryEndpoint::sink();
/// let mut window = ByteWindow::allocate(1024);
///
/// let report = transfer::copy(&mut source, &mut sink, &mut window).unwrap();
/// assert_eq!(report.bytes, 2500);
/// assert_eq!(report.cycles, 3);
/// assert_eq!(sink.contents(), vec![7u8; 2500].as_slice());
/// ```
pub fn copy<S, D>(source: &mut S, sink: &mut D, window: &mut ByteWindow) -> Result<TransferReport>
where
    S: Endpoint + ?Sized,
    D: Endpoint + ?Sized,
{
    if window.capacity() == 0 {
        return Err(TransferError::EmptyWindow.into());
    }

    let mut report = TransferReport::new(Strategy::Buffered);
    window.clear();
    loop {
        let read = match source.read_into(window)? {
            ReadStatus::Eof => break,
            ReadStatus::Bytes(n) => n,
        };

        window.flip();
        while window.has_remaining() {
            if sink.write_from(window)? == 0 {
                return Err(TransferError::SinkStalled {
                    pending: window.remaining(),
                }
                .into());
            }
        }
        window.clear();

        report.bytes += read as u64;
        report.cycles += 1;
        trace!(cycle = report.cycles, bytes = read, "transfer cycle");
    }

    debug!(
        source = %source.name(),
        sink = %sink.name(),
        bytes = report.bytes,
        cycles = report.cycles,
        "buffered copy complete"
    );
    Ok(report)
}

/// Copies the file at `src` to `dst` with the chosen strategy.
///
/// `dst` is created if missing and truncated first. Both files are closed
/// before returning, also on failure; a close failure is reported only when
/// the copy itself succeeded.
///
/// # Arguments
///
/// * `src` - File to read.
/// * `dst` - File to write.
/// * `strategy` - How to move the bytes.
/// * `window_size` - Window capacity for [`Strategy::Buffered`].
///
/// # Errors
///
/// Returns an error if either file cannot be opened, the copy fails, or a
/// file cannot be closed.
pub fn copy_file<P, Q>(
    src: P,
    dst: Q,
    strategy: Strategy,
    window_size: usize,
) -> Result<TransferReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut source = FileEndpoint::open(src, OpenMode::READ)?;
    let sink_mode = match strategy {
        Strategy::Mapped => OpenMode::READ | OpenMode::WRITE | OpenMode::CREATE,
        Strategy::Buffered | Strategy::Direct => OpenMode::WRITE | OpenMode::CREATE,
    };
    // `source` is closed by drop if this fails
    let mut sink = FileEndpoint::open(dst, sink_mode)?;

    let outcome = run_strategy(&mut source, &mut sink, strategy, window_size);
    let closed = {
        let mut endpoints: [&mut dyn Endpoint; 2] = [&mut source, &mut sink];
        close_all(&mut endpoints)
    };

    match (outcome, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "close failed after transfer error");
            Err(err)
        }
    }
}

fn run_strategy(
    source: &mut FileEndpoint,
    sink: &mut FileEndpoint,
    strategy: Strategy,
    window_size: usize,
) -> Result<TransferReport> {
    ensure_distinct(source, sink)?;
    match strategy {
        Strategy::Buffered => {
            sink.truncate(0)?;
            let mut window = ByteWindow::allocate(window_size);
            copy(source, sink, &mut window)
        }
        Strategy::Direct => {
            sink.truncate(0)?;
            let length = source.size()?;
            transfer_fully(source, sink, 0, length)
        }
        Strategy::Mapped => {
            let bytes = copy_mapped(source, sink)?;
            Ok(TransferReport {
                strategy: Strategy::Mapped,
                bytes,
                cycles: u64::from(bytes > 0),
            })
        }
    }
}

/// Rejects a sink that is the source file itself; truncating it would
/// destroy the data before it is read.
pub(crate) fn ensure_distinct(source: &FileEndpoint, sink: &FileEndpoint) -> Result<()> {
    if source.same_file(sink)? {
        return Err(CommandError::InvalidArgument(
            "source and destination are the same file".to_string(),
        )
        .into());
    }
    Ok(())
}
