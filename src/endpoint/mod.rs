//! Byte sources and sinks.
//!
//! An [`Endpoint`] moves bytes between a [`ByteWindow`] and some resource:
//! a file, one half of an OS pipe, or an in-memory array. Endpoints own
//! their resource, close idempotently, and close themselves on drop.

pub mod file;
pub mod memory;
pub mod pipe;

pub use file::{FileEndpoint, OpenMode};
pub use memory::MemoryEndpoint;
pub use pipe::{PipeSink, PipeSource, pipe};

use crate::core::ByteWindow;
use crate::error::{EndpointError, Result};
use std::io::{ErrorKind, Read, Write};
use tracing::{debug, warn};

/// Outcome of a read into a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// This many bytes landed in the window (possibly zero when the window
    /// had no room).
    Bytes(usize),
    /// The resource is exhausted and nothing was read.
    Eof,
}

impl ReadStatus {
    /// Returns `true` for [`ReadStatus::Eof`].
    #[must_use]
    pub const fn is_eof(self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns the byte count, treating EOF as zero.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Bytes(n) => n,
            Self::Eof => 0,
        }
    }

    /// Returns the count with EOF encoded as `-1`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn as_count(self) -> i64 {
        match self {
            Self::Bytes(n) => n as i64,
            Self::Eof => -1,
        }
    }
}

/// A byte-oriented source and/or sink.
///
/// Implementations override the directions they support; the default
/// [`read_into`](Endpoint::read_into) and [`write_from`](Endpoint::write_from)
/// fail with [`EndpointError::UnsupportedOperation`].
///
/// # Examples
///
/// ```
/// use chanio::{ByteWindow, Endpoint, MemoryEndpoint, ReadStatus};
///
/// let mut source = MemoryEndpoint::from_bytes(b"hello".to_vec());
/// let mut window = ByteWindow::allocate(16);
/// assert_eq!(source.read_into(&mut window).unwrap(), ReadStatus::Bytes(5));
/// assert_eq!(window.position(), 5);
/// ```
pub trait Endpoint {
    /// Returns a short description used in logs and errors.
    fn name(&self) -> String;

    /// Returns `true` until [`close`](Endpoint::close) has been called.
    fn is_open(&self) -> bool;

    /// Releases the underlying resource.
    ///
    /// Calling this on a closed endpoint is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource reports a failure while being
    /// released. The endpoint counts as closed either way.
    fn close(&mut self) -> Result<()>;

    /// Reads up to `window.remaining()` bytes in at `window.position()`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Closed`] after close,
    /// [`EndpointError::UnsupportedOperation`] for write-only endpoints, and
    /// [`EndpointError::Io`] on resource failure.
    fn read_into(&mut self, window: &mut ByteWindow) -> Result<ReadStatus> {
        let _ = window;
        Err(self.unsupported("read_into"))
    }

    /// Writes the bytes between `window.position()` and `window.limit()`,
    /// advancing the position by the count written.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Closed`] after close,
    /// [`EndpointError::UnsupportedOperation`] for read-only endpoints, and
    /// [`EndpointError::Io`] on resource failure.
    fn write_from(&mut self, window: &mut ByteWindow) -> Result<usize> {
        let _ = window;
        Err(self.unsupported("write_from"))
    }

    /// Scatter read: fills `windows` in order, each completely before the
    /// next.
    ///
    /// Stops at EOF, at a short read, or once every window is full. Returns
    /// [`ReadStatus::Eof`] only if nothing was read and the resource was
    /// already exhausted.
    fn read_into_all(&mut self, windows: &mut [ByteWindow]) -> Result<ReadStatus> {
        self.ensure_open()?;
        let mut total = 0;
        for window in windows.iter_mut() {
            if !window.has_remaining() {
                continue;
            }
            let wanted = window.remaining();
            match self.read_into(window)? {
                ReadStatus::Eof if total == 0 => return Ok(ReadStatus::Eof),
                ReadStatus::Eof => break,
                ReadStatus::Bytes(n) => {
                    total += n;
                    if n < wanted {
                        break;
                    }
                }
            }
        }
        Ok(ReadStatus::Bytes(total))
    }

    /// Gather write: drains `windows` in order.
    ///
    /// Stops early when the resource accepts zero bytes. Returns the total
    /// written across all windows.
    fn write_from_all(&mut self, windows: &mut [ByteWindow]) -> Result<usize> {
        self.ensure_open()?;
        let mut total = 0;
        'windows: for window in windows.iter_mut() {
            while window.has_remaining() {
                let n = self.write_from(window)?;
                if n == 0 {
                    break 'windows;
                }
                total += n;
            }
        }
        Ok(total)
    }

    /// Fails with [`EndpointError::Closed`] once the endpoint is closed.
    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(EndpointError::Closed {
                endpoint: self.name(),
            }
            .into())
        }
    }

    /// Builds the error for a direction this endpoint does not support.
    fn unsupported(&self, operation: &'static str) -> crate::Error {
        EndpointError::UnsupportedOperation {
            operation,
            endpoint: self.name(),
        }
        .into()
    }
}

/// Closes every endpoint, even when some of them fail.
///
/// Returns the first failure after all endpoints have been attempted.
///
/// # Errors
///
/// Returns the first close error encountered.
pub fn close_all(endpoints: &mut [&mut dyn Endpoint]) -> Result<()> {
    let mut first_err = None;
    for endpoint in endpoints.iter_mut() {
        if let Err(e) = endpoint.close() {
            warn!(endpoint = %endpoint.name(), error = %e, "close failed");
            first_err.get_or_insert(e);
        }
    }
    first_err.map_or(Ok(()), Err)
}

/// Reads until the window is full or the reader reports end of stream.
///
/// A failure after some bytes have landed returns the partial count; the
/// error surfaces on the next call.
pub(crate) fn fill_window<R: Read>(
    reader: &mut R,
    window: &mut ByteWindow,
    name: &str,
) -> Result<ReadStatus> {
    if !window.has_remaining() {
        return Ok(ReadStatus::Bytes(0));
    }
    let mut total = 0;
    while window.has_remaining() {
        match reader.read(window.as_writable_mut()) {
            Ok(0) => break,
            Ok(n) => {
                window.advance(n)?;
                total += n;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if total > 0 => {
                debug!(endpoint = name, bytes = total, error = %e, "short fill before read error");
                break;
            }
            Err(e) => return Err(EndpointError::io(name, e).into()),
        }
    }
    if total == 0 {
        Ok(ReadStatus::Eof)
    } else {
        Ok(ReadStatus::Bytes(total))
    }
}

/// Performs one successful read (retrying on interrupt); the count may be
/// short.
pub(crate) fn read_once<R: Read>(
    reader: &mut R,
    window: &mut ByteWindow,
    name: &str,
) -> Result<ReadStatus> {
    if !window.has_remaining() {
        return Ok(ReadStatus::Bytes(0));
    }
    loop {
        match reader.read(window.as_writable_mut()) {
            Ok(0) => return Ok(ReadStatus::Eof),
            Ok(n) => {
                window.advance(n)?;
                return Ok(ReadStatus::Bytes(n));
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(EndpointError::io(name, e).into()),
        }
    }
}

/// Writes the window's remaining bytes, advancing the position as bytes
/// are accepted so a failure leaves the window at the last good offset.
pub(crate) fn drain_window<W: Write>(
    writer: &mut W,
    window: &mut ByteWindow,
    name: &str,
) -> Result<usize> {
    let mut total = 0;
    while window.has_remaining() {
        match writer.write(window.as_readable()) {
            Ok(0) => break,
            Ok(n) => {
                window.advance(n)?;
                total += n;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(EndpointError::io(name, e).into()),
        }
    }
    Ok(total)
}
