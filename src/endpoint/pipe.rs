//! Unidirectional OS pipe endpoints.
//!
//! [`pipe`] returns a connected [`PipeSink`] / [`PipeSource`] pair. Bytes
//! written to the sink come out of the source in order. The sink cannot be
//! read and the source cannot be written.
//!
//! Both halves block. Writing more than the OS pipe buffer from the same
//! thread that will later read the source blocks forever, so keep
//! single-threaded messages small.

use super::{Endpoint, ReadStatus, drain_window, read_once};
use crate::core::ByteWindow;
use crate::error::{EndpointError, Result};
use std::io::{PipeReader, PipeWriter};
use tracing::{debug, trace};

/// Write half of a pipe.
#[derive(Debug)]
pub struct PipeSink {
    writer: Option<PipeWriter>,
}

/// Read half of a pipe.
#[derive(Debug)]
pub struct PipeSource {
    reader: Option<PipeReader>,
}

/// Opens an OS pipe and returns its `(sink, source)` halves.
///
/// # Errors
///
/// Returns [`EndpointError::Io`] if the OS cannot create the pipe.
///
/// # Examples
///
/// ```
/// use chanio::{ByteWindow, Endpoint, pipe};
///
/// let (mut sink, mut source) = pipe().unwrap();
/// let mut window = ByteWindow::wrap(b"ping".to_vec());
/// sink.write_from(&mut window).unwrap();
///
/// let mut window = ByteWindow::allocate(16);
/// let read = source.read_into(&mut window).unwrap();
/// assert_eq!(read.bytes(), 4);
/// ```
pub fn pipe() -> Result<(PipeSink, PipeSource)> {
    let (reader, writer) = std::io::pipe().map_err(|e| EndpointError::io("pipe", e))?;
    debug!("opened pipe");
    Ok((
        PipeSink {
            writer: Some(writer),
        },
        PipeSource {
            reader: Some(reader),
        },
    ))
}

impl Endpoint for PipeSink {
    fn name(&self) -> String {
        "pipe-sink".to_string()
    }

    fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn close(&mut self) -> Result<()> {
        if self.writer.take().is_some() {
            trace!("closed pipe sink");
        }
        Ok(())
    }

    fn write_from(&mut self, window: &mut ByteWindow) -> Result<usize> {
        let name = self.name();
        let writer = self.writer.as_mut().ok_or(EndpointError::Closed {
            endpoint: name.clone(),
        })?;
        drain_window(writer, window, &name)
    }
}

impl Endpoint for PipeSource {
    fn name(&self) -> String {
        "pipe-source".to_string()
    }

    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn close(&mut self) -> Result<()> {
        if self.reader.take().is_some() {
            trace!("closed pipe source");
        }
        Ok(())
    }

    /// Performs a single blocking read; the result may be short. Returns
    /// [`ReadStatus::Eof`] once the sink is closed and drained.
    fn read_into(&mut self, window: &mut ByteWindow) -> Result<ReadStatus> {
        let name = self.name();
        let reader = self.reader.as_mut().ok_or(EndpointError::Closed {
            endpoint: name.clone(),
        })?;
        read_once(reader, window, &name)
    }
}
