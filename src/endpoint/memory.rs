//! In-memory endpoint.

use super::{Endpoint, ReadStatus};
use crate::core::ByteWindow;
use crate::error::Result;

/// Endpoint over an in-memory byte array.
///
/// Reads consume the array from the front; writes append to it. A bounded
/// endpoint accepts at most `max_len` bytes in total and returns `0` from
/// [`write_from`](Endpoint::write_from) once full.
///
/// # Examples
///
/// ```
/// use chanio::{ByteWindow, Endpoint, MemoryEndpoint};
///
/// let mut sink = MemoryEndpoint::bounded(3);
/// let mut window = ByteWindow::wrap(b"abcdef".to_vec());
/// assert_eq!(sink.write_from(&mut window).unwrap(), 3);
/// assert_eq!(sink.write_from(&mut window).unwrap(), 0);
/// assert_eq!(sink.contents(), b"abc");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryEndpoint {
    data: Vec<u8>,
    read_pos: usize,
    max_len: Option<usize>,
    closed: bool,
}

impl MemoryEndpoint {
    /// Creates a readable endpoint over `bytes`.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: bytes.into(),
            ..Self::default()
        }
    }

    /// Creates an empty, unbounded sink.
    #[must_use]
    pub fn sink() -> Self {
        Self::default()
    }

    /// Creates an empty sink that accepts at most `max_len` bytes.
    #[must_use]
    pub fn bounded(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::default()
        }
    }

    /// Returns every byte held, including bytes already read.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Returns the bytes not yet read.
    #[must_use]
    pub fn unread(&self) -> &[u8] {
        &self.data[self.read_pos..]
    }

    /// Consumes the endpoint and returns its bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn space(&self) -> usize {
        self.max_len
            .map_or(usize::MAX, |max| max.saturating_sub(self.data.len()))
    }
}

impl Endpoint for MemoryEndpoint {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn is_open(&self) -> bool {
        !self.closed
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn read_into(&mut self, window: &mut ByteWindow) -> Result<ReadStatus> {
        self.ensure_open()?;
        if !window.has_remaining() {
            return Ok(ReadStatus::Bytes(0));
        }
        let unread = self.unread();
        if unread.is_empty() {
            return Ok(ReadStatus::Eof);
        }
        let n = unread.len().min(window.remaining());
        window.put(&unread[..n])?;
        self.read_pos += n;
        Ok(ReadStatus::Bytes(n))
    }

    fn write_from(&mut self, window: &mut ByteWindow) -> Result<usize> {
        self.ensure_open()?;
        let n = window.remaining().min(self.space());
        self.data.extend_from_slice(&window.as_readable()[..n]);
        window.advance(n)?;
        Ok(n)
    }
}
