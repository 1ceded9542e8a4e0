//! File endpoints.
//!
//! A [`FileEndpoint`] wraps an open `std::fs::File` together with the
//! [`OpenMode`] it was opened with. Reads fill the window until it is full
//! or the file ends; writes drain the window completely.

use super::{Endpoint, ReadStatus, drain_window, fill_window};
use crate::core::ByteWindow;
use crate::error::{EndpointError, Result};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::ops::BitOr;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Combinable open flags: [`OpenMode::READ`], [`OpenMode::WRITE`],
/// [`OpenMode::CREATE`].
///
/// Accepted combinations are `READ`, `WRITE`, `READ | WRITE`,
/// `WRITE | CREATE` and `READ | WRITE | CREATE`.
///
/// # Examples
///
/// ```
/// use chanio::OpenMode;
///
/// let mode = OpenMode::READ | OpenMode::WRITE | OpenMode::CREATE;
/// assert!(mode.validate().is_ok());
/// assert!((OpenMode::READ | OpenMode::CREATE).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenMode {
    bits: u8,
}

impl OpenMode {
    /// Open for reading.
    pub const READ: Self = Self { bits: 0b001 };
    /// Open for writing.
    pub const WRITE: Self = Self { bits: 0b010 };
    /// Create the file if it does not exist (requires `WRITE`).
    pub const CREATE: Self = Self { bits: 0b100 };

    /// Returns the empty flag set.
    #[must_use]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Returns `true` if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }

    /// Returns `true` if the mode allows reading.
    #[must_use]
    pub const fn is_readable(self) -> bool {
        self.contains(Self::READ)
    }

    /// Returns `true` if the mode allows writing.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.contains(Self::WRITE)
    }

    /// Checks that the flag combination can be opened.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidMode`] for the empty set and for
    /// `CREATE` without `WRITE`.
    pub fn validate(self) -> std::result::Result<(), EndpointError> {
        let no_direction = !self.is_readable() && !self.is_writable();
        let create_without_write = self.contains(Self::CREATE) && !self.is_writable();
        if no_direction || create_without_write {
            return Err(EndpointError::InvalidMode {
                mode: self.to_string(),
            });
        }
        Ok(())
    }

    fn options(self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        opts.read(self.is_readable())
            .write(self.is_writable())
            .create(self.contains(Self::CREATE));
        opts
    }
}

impl BitOr for OpenMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::READ, "READ"),
            (Self::WRITE, "WRITE"),
            (Self::CREATE, "CREATE"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();

        if names.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Endpoint over a file opened with an [`OpenMode`].
///
/// The file is closed by [`Endpoint::close`] or when the endpoint is
/// dropped.
///
/// # Examples
///
/// ```no_run
/// use chanio::{ByteWindow, Endpoint, FileEndpoint, OpenMode};
///
/// let mut file = FileEndpoint::open("input.bin", OpenMode::READ).unwrap();
/// let mut window = ByteWindow::allocate(1024);
/// let status = file.read_into(&mut window).unwrap();
/// file.close().unwrap();
/// ```
#[derive(Debug)]
pub struct FileEndpoint {
    /// `None` once closed.
    file: Option<File>,
    path: PathBuf,
    mode: OpenMode,
}

impl FileEndpoint {
    /// Opens `path` with the given flags.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file.
    /// * `mode` - Flag combination; see [`OpenMode`].
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidMode`] for unsupported flag sets and
    /// [`EndpointError::Io`] if the OS refuses the open.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        mode.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = mode
            .options()
            .open(&path)
            .map_err(|e| EndpointError::io(describe(&path), e))?;

        debug!(path = %path.display(), %mode, "opened file endpoint");
        Ok(Self {
            file: Some(file),
            path,
            mode,
        })
    }

    /// Returns the path the endpoint was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the open flags.
    #[must_use]
    pub const fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Returns the current file size in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is closed or metadata is unavailable.
    pub fn size(&self) -> Result<u64> {
        let metadata = self
            .handle()?
            .metadata()
            .map_err(|e| EndpointError::io(self.name(), e))?;
        Ok(metadata.len())
    }

    /// Returns the file cursor used by reads and writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is closed or the seek fails.
    pub fn position(&self) -> Result<u64> {
        let mut handle = self.handle()?;
        handle
            .stream_position()
            .map_err(|e| EndpointError::io(self.name(), e).into())
    }

    /// Moves the file cursor to an absolute offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is closed or the seek fails.
    pub fn set_position(&mut self, offset: u64) -> Result<()> {
        let mut handle = self.handle()?;
        handle
            .seek(SeekFrom::Start(offset))
            .map_err(|e| EndpointError::io(self.name(), e))?;
        Ok(())
    }

    /// Truncates or extends the file to `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is closed, not writable, or the
    /// resize fails.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        if !self.mode.is_writable() {
            self.ensure_open()?;
            return Err(self.unsupported("truncate"));
        }
        self.handle()?
            .set_len(len)
            .map_err(|e| EndpointError::io(self.name(), e).into())
    }

    /// Flushes file data and metadata to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is closed or the sync fails.
    pub fn sync(&self) -> Result<()> {
        self.handle()?
            .sync_all()
            .map_err(|e| EndpointError::io(self.name(), e).into())
    }

    /// Returns `true` if both endpoints refer to the same file on disk,
    /// even when opened through different paths.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is closed or metadata is
    /// unavailable.
    #[cfg(unix)]
    pub fn same_file(&self, other: &Self) -> Result<bool> {
        use std::os::unix::fs::MetadataExt;

        let ours = self
            .handle()?
            .metadata()
            .map_err(|e| EndpointError::io(self.name(), e))?;
        let theirs = other
            .handle()?
            .metadata()
            .map_err(|e| EndpointError::io(other.name(), e))?;
        Ok(ours.dev() == theirs.dev() && ours.ino() == theirs.ino())
    }

    /// Returns `true` if both endpoints refer to the same file on disk,
    /// even when opened through different paths.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is closed or a path cannot be
    /// resolved.
    #[cfg(not(unix))]
    pub fn same_file(&self, other: &Self) -> Result<bool> {
        self.ensure_open()?;
        other.ensure_open()?;
        let ours = self
            .path
            .canonicalize()
            .map_err(|e| EndpointError::io(self.name(), e))?;
        let theirs = other
            .path
            .canonicalize()
            .map_err(|e| EndpointError::io(other.name(), e))?;
        Ok(ours == theirs)
    }

    /// Returns the open file, or [`EndpointError::Closed`].
    pub(crate) fn handle(&self) -> Result<&File> {
        self.file.as_ref().ok_or_else(|| {
            EndpointError::Closed {
                endpoint: self.name(),
            }
            .into()
        })
    }
}

impl Endpoint for FileEndpoint {
    fn name(&self) -> String {
        describe(&self.path)
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Closes the file. Writable files are synced first so deferred write
    /// failures surface here instead of being lost.
    fn close(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        trace!(path = %self.path.display(), "closing file endpoint");
        if self.mode.is_writable() {
            file.sync_all()
                .map_err(|e| EndpointError::io(describe(&self.path), e))?;
        }
        Ok(())
    }

    fn read_into(&mut self, window: &mut ByteWindow) -> Result<ReadStatus> {
        let name = self.name();
        if !self.mode.is_readable() {
            self.ensure_open()?;
            return Err(self.unsupported("read_into"));
        }
        let mut handle = self.handle()?;
        fill_window(&mut handle, window, &name)
    }

    fn write_from(&mut self, window: &mut ByteWindow) -> Result<usize> {
        let name = self.name();
        if !self.mode.is_writable() {
            self.ensure_open()?;
            return Err(self.unsupported("write_from"));
        }
        let mut handle = self.handle()?;
        drain_window(&mut handle, window, &name)
    }
}

impl Drop for FileEndpoint {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "close on drop failed");
        }
    }
}

fn describe(path: &Path) -> String {
    format!("file:{}", path.display())
}
