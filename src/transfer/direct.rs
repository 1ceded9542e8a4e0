//! Direct file-to-file transfer.
//!
//! On Linux (glibc) the kernel copies the bytes with `copy_file_range(2)`.
//! When the call is unavailable or refused for this pair of files (old
//! kernel, cross-device, unsupported filesystem) the transfer falls back to
//! a bounded read into a window followed by a positional write.

use super::{Strategy, TransferReport};
use crate::core::ByteWindow;
use crate::endpoint::{Endpoint, FileEndpoint, fill_window};
use crate::error::{EndpointError, Result};
use std::fs::File;
use std::io;
use tracing::debug;

/// Largest span handed to the kernel in one call.
const DIRECT_CHUNK: u64 = 64 * 1024 * 1024;

/// Window size used when the kernel path is unavailable.
const FALLBACK_CHUNK: u64 = 64 * 1024;

/// Transfers up to `length` bytes from `source` into `sink` at `offset`.
///
/// Bytes are read from the source's current file position, which advances.
/// The sink's own file position does not move. The return value may be
/// less than `length`, and is zero once the source is exhausted; callers
/// loop (or use [`transfer_fully`]) to move the whole range.
///
/// # Arguments
///
/// * `source` - Readable file endpoint.
/// * `sink` - Writable file endpoint.
/// * `offset` - Byte offset in the sink where writing starts.
/// * `length` - Maximum number of bytes to move.
///
/// # Errors
///
/// Returns [`EndpointError::Closed`] if either endpoint is closed,
/// [`EndpointError::UnsupportedOperation`] if the source is not readable
/// or the sink not writable, and [`EndpointError::Io`] on OS failure.
pub fn transfer(
    source: &mut FileEndpoint,
    sink: &mut FileEndpoint,
    offset: u64,
    length: u64,
) -> Result<u64> {
    source.ensure_open()?;
    sink.ensure_open()?;
    if !source.mode().is_readable() {
        return Err(source.unsupported("transfer"));
    }
    if !sink.mode().is_writable() {
        return Err(sink.unsupported("transfer"));
    }
    if length == 0 {
        return Ok(0);
    }

    let src = source.handle()?;
    let dst = sink.handle()?;
    let span = length.min(DIRECT_CHUNK);

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    {
        match kernel_copy(src, dst, offset, span) {
            Ok(Some(n)) => {
                tracing::trace!(offset, requested = length, moved = n, "copy_file_range");
                return Ok(n);
            }
            Ok(None) => {
                debug!("copy_file_range unavailable, using buffered fallback");
            }
            Err(e) => return Err(EndpointError::io(sink.name(), e).into()),
        }
    }

    buffered_copy(
        src,
        dst,
        offset,
        span.min(FALLBACK_CHUNK),
        &source.name(),
        &sink.name(),
    )
}

/// Loops [`transfer`] until `length` bytes moved or the source runs dry.
///
/// # Errors
///
/// Returns the first error from [`transfer`].
///
/// # Examples
///
/// ```no_run
/// use chanio::{FileEndpoint, OpenMode, transfer};
///
/// let mut input = FileEndpoint::open("1.jpg", OpenMode::READ).unwrap();
/// let mut output = FileEndpoint::open(
///     "3.jpg",
///     OpenMode::READ | OpenMode::WRITE | OpenMode::CREATE,
/// )
/// .unwrap();
/// let size = input.size().unwrap();
/// let report = transfer::transfer_fully(&mut input, &mut output, 0, size).unwrap();
/// assert_eq!(report.bytes, size);
/// ```
pub fn transfer_fully(
    source: &mut FileEndpoint,
    sink: &mut FileEndpoint,
    offset: u64,
    length: u64,
) -> Result<TransferReport> {
    let mut report = TransferReport::new(Strategy::Direct);
    while report.bytes < length {
        let moved = transfer(
            source,
            sink,
            offset + report.bytes,
            length - report.bytes,
        )?;
        if moved == 0 {
            break;
        }
        report.bytes += moved;
        report.cycles += 1;
    }

    debug!(
        source = %source.name(),
        sink = %sink.name(),
        bytes = report.bytes,
        calls = report.cycles,
        "direct transfer complete"
    );
    Ok(report)
}

/// Returns `Ok(None)` when the kernel refuses the call for reasons the
/// buffered path can handle.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[allow(unsafe_code)]
fn kernel_copy(src: &File, dst: &File, offset: u64, length: u64) -> io::Result<Option<u64>> {
    use std::os::fd::AsRawFd;

    let mut off_out = libc::loff_t::try_from(offset)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset exceeds loff_t"))?;
    let len = usize::try_from(length).unwrap_or(usize::MAX);

    loop {
        // Safety: both descriptors are open for the duration of the call,
        // the input offset is taken from the descriptor, and `off_out` is a
        // valid exclusive pointer.
        let ret = unsafe {
            libc::copy_file_range(
                src.as_raw_fd(),
                std::ptr::null_mut(),
                dst.as_raw_fd(),
                &raw mut off_out,
                len,
                0,
            )
        };
        if ret >= 0 {
            #[allow(clippy::cast_sign_loss)]
            return Ok(Some(ret as u64));
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) => {}
            Some(libc::ENOSYS | libc::EOPNOTSUPP | libc::EXDEV | libc::EINVAL) => return Ok(None),
            _ => return Err(err),
        }
    }
}

/// Source failures keep the source's name; only the positional write is
/// attributed to the sink.
fn buffered_copy(
    src: &File,
    dst: &File,
    offset: u64,
    length: u64,
    source_name: &str,
    sink_name: &str,
) -> Result<u64> {
    #[allow(clippy::cast_possible_truncation)]
    let mut window = ByteWindow::allocate(length as usize);
    let mut reader = src;
    if fill_window(&mut reader, &mut window, source_name)?.is_eof() {
        return Ok(0);
    }
    window.flip();
    write_all_at(dst, window.as_readable(), offset)
        .map_err(|e| EndpointError::io(sink_name, e))?;
    Ok(window.remaining() as u64)
}

#[cfg(unix)]
fn write_all_at(dst: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    dst.write_all_at(buf, offset)
}

#[cfg(not(unix))]
fn write_all_at(dst: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::io::{Seek, SeekFrom, Write};

    let mut handle = dst;
    let saved = handle.stream_position()?;
    handle.seek(SeekFrom::Start(offset))?;
    handle.write_all(buf)?;
    handle.seek(SeekFrom::Start(saved))?;
    Ok(())
}
