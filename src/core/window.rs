//! Fixed-capacity byte window with cursor bookkeeping.
//!
//! A [`ByteWindow`] holds a fixed block of bytes plus four cursors:
//! `mark <= position <= limit <= capacity`. Writers `put` bytes at
//! `position`; [`ByteWindow::flip`] turns the written region into a readable
//! region; [`ByteWindow::clear`] hands the whole block back to writers.

use crate::error::WindowError;
use serde::{Deserialize, Serialize};

/// A fixed-capacity byte container with `mark`, `position`, `limit` and
/// `capacity` cursors.
///
/// The invariant `0 <= mark <= position <= limit <= capacity` holds after
/// every call. Operations that would break it fail with a [`WindowError`]
/// and leave all cursors untouched.
///
/// # Examples
///
/// ```
/// use chanio::ByteWindow;
///
/// let mut window = ByteWindow::allocate(1024);
/// window.put(b"abcdef").unwrap();
/// assert_eq!(window.position(), 6);
///
/// window.flip();
/// assert_eq!(window.limit(), 6);
/// assert_eq!(window.get(6).unwrap(), b"abcdef");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteWindow {
    /// Backing storage; its length is the capacity.
    data: Box<[u8]>,
    position: usize,
    limit: usize,
    mark: Option<usize>,
}

/// Point-in-time copy of a window's cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    /// Fixed capacity.
    pub capacity: usize,
    /// Current limit.
    pub limit: usize,
    /// Current position.
    pub position: usize,
    /// Marked position, if any.
    pub mark: Option<usize>,
}

impl ByteWindow {
    /// Allocates a zero-filled window of `capacity` bytes in write-mode.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Fixed size of the window in bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use chanio::ByteWindow;
    ///
    /// let window = ByteWindow::allocate(1024);
    /// assert_eq!(window.position(), 0);
    /// assert_eq!(window.limit(), 1024);
    /// assert_eq!(window.capacity(), 1024);
    /// assert_eq!(window.mark_position(), None);
    /// ```
    #[must_use]
    pub fn allocate(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            position: 0,
            limit: capacity,
            mark: None,
        }
    }

    /// Wraps existing bytes in read-mode: `position = 0` and
    /// `limit = capacity = bytes.len()`.
    #[must_use]
    pub fn wrap(bytes: impl Into<Vec<u8>>) -> Self {
        let data = bytes.into().into_boxed_slice();
        let limit = data.len();
        Self {
            data,
            position: 0,
            limit,
            mark: None,
        }
    }

    /// Returns the fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the current position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the current limit.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the marked position, or `None` when no mark is set.
    #[must_use]
    pub const fn mark_position(&self) -> Option<usize> {
        self.mark
    }

    /// Returns `limit - position`.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// Returns `true` if any bytes remain between position and limit.
    #[must_use]
    pub const fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// Captures the cursors for display or serialization.
    #[must_use]
    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            capacity: self.capacity(),
            limit: self.limit,
            position: self.position,
            mark: self.mark,
        }
    }

    /// Copies `bytes` in at `position` and advances it.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Overflow`] if `position + bytes.len() > limit`.
    pub fn put(&mut self, bytes: &[u8]) -> Result<(), WindowError> {
        let remaining = self.remaining();
        if bytes.len() > remaining {
            return Err(WindowError::Overflow {
                requested: bytes.len(),
                remaining,
            });
        }
        let end = self.position + bytes.len();
        self.data[self.position..end].copy_from_slice(bytes);
        self.position = end;
        Ok(())
    }

    /// Writes a single byte at `position` and advances it.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Overflow`] if the window is full.
    pub fn put_u8(&mut self, byte: u8) -> Result<(), WindowError> {
        self.put(&[byte])
    }

    /// Reads `count` bytes from `position` and advances it.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Underflow`] if fewer than `count` bytes remain.
    pub fn get(&mut self, count: usize) -> Result<Vec<u8>, WindowError> {
        self.check_underflow(count)?;
        let start = self.position;
        self.position += count;
        Ok(self.data[start..self.position].to_vec())
    }

    /// Reads a single byte from `position` and advances it.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Underflow`] if nothing remains.
    pub fn get_u8(&mut self) -> Result<u8, WindowError> {
        self.check_underflow(1)?;
        let byte = self.data[self.position];
        self.position += 1;
        Ok(byte)
    }

    /// Copies `length` bytes from `position` into `dest[offset..offset + length]`.
    ///
    /// # Arguments
    ///
    /// * `dest` - Destination slice.
    /// * `offset` - First index in `dest` to write.
    /// * `length` - Number of bytes to copy.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::OutOfBounds`] if the destination range does
    /// not fit in `dest`, or [`WindowError::Underflow`] if fewer than
    /// `length` bytes remain. Neither moves the cursors.
    ///
    /// # Examples
    ///
    /// ```
    /// use chanio::ByteWindow;
    ///
    /// let mut window = ByteWindow::wrap(b"abcdef".to_vec());
    /// let mut dst = [0u8; 6];
    /// window.get_into(&mut dst, 0, 2).unwrap();
    /// window.mark();
    /// window.get_into(&mut dst, 2, 2).unwrap();
    /// window.reset().unwrap();
    /// assert_eq!(window.position(), 2);
    /// assert_eq!(&dst[..4], b"abcd");
    /// ```
    pub fn get_into(
        &mut self,
        dest: &mut [u8],
        offset: usize,
        length: usize,
    ) -> Result<(), WindowError> {
        let end = offset.checked_add(length).ok_or(WindowError::OutOfBounds {
            what: "destination offset",
            index: offset,
            max: dest.len(),
        })?;
        if end > dest.len() {
            return Err(WindowError::OutOfBounds {
                what: "destination end",
                index: end,
                max: dest.len(),
            });
        }
        self.check_underflow(length)?;

        let start = self.position;
        self.position += length;
        dest[offset..end].copy_from_slice(&self.data[start..self.position]);
        Ok(())
    }

    /// Switches from write-mode to read-mode: `limit = position`,
    /// `position = 0`, mark cleared.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
        self.mark = None;
    }

    /// Switches back to write-mode over the whole block: `position = 0`,
    /// `limit = capacity`, mark cleared. The bytes themselves are kept.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity();
        self.mark = None;
    }

    /// Re-reads the current region: `position = 0`, limit kept, mark cleared.
    pub fn rewind(&mut self) {
        self.position = 0;
        self.mark = None;
    }

    /// Records the current position as the mark.
    pub fn mark(&mut self) {
        self.mark = Some(self.position);
    }

    /// Moves `position` back to the mark.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidMark`] if no mark is set.
    pub fn reset(&mut self) -> Result<(), WindowError> {
        let mark = self.mark.ok_or(WindowError::InvalidMark)?;
        self.position = mark;
        Ok(())
    }

    /// Moves `position` to an absolute index. A mark above the new position
    /// is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::OutOfBounds`] if `position > limit`.
    pub fn set_position(&mut self, position: usize) -> Result<(), WindowError> {
        if position > self.limit {
            return Err(WindowError::OutOfBounds {
                what: "position",
                index: position,
                max: self.limit,
            });
        }
        if self.mark.is_some_and(|m| m > position) {
            self.mark = None;
        }
        self.position = position;
        Ok(())
    }

    /// Moves `limit` to an absolute index. `position` is pulled down to the
    /// new limit if needed, and a mark above it is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::OutOfBounds`] if `limit > capacity`.
    pub fn set_limit(&mut self, limit: usize) -> Result<(), WindowError> {
        if limit > self.capacity() {
            return Err(WindowError::OutOfBounds {
                what: "limit",
                index: limit,
                max: self.capacity(),
            });
        }
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
        if self.mark.is_some_and(|m| m > limit) {
            self.mark = None;
        }
        Ok(())
    }

    /// Moves the unread bytes `[position, limit)` to the front and returns to
    /// write-mode after them.
    ///
    /// Useful when a sink only drained part of the window and the caller
    /// wants to keep filling without losing the tail.
    pub fn compact(&mut self) {
        let remaining = self.remaining();
        self.data.copy_within(self.position..self.limit, 0);
        self.position = remaining;
        self.limit = self.capacity();
        self.mark = None;
    }

    /// Advances `position` by `count` after bytes were moved through
    /// [`as_writable_mut`](Self::as_writable_mut) or
    /// [`as_readable`](Self::as_readable).
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::OutOfBounds`] if `count > remaining()`.
    pub fn advance(&mut self, count: usize) -> Result<(), WindowError> {
        if count > self.remaining() {
            return Err(WindowError::OutOfBounds {
                what: "advance",
                index: count,
                max: self.remaining(),
            });
        }
        self.position += count;
        Ok(())
    }

    /// Returns the whole backing block, ignoring cursors.
    #[must_use]
    pub fn array(&self) -> &[u8] {
        &self.data
    }

    /// Returns the bytes between position and limit.
    #[must_use]
    pub fn as_readable(&self) -> &[u8] {
        &self.data[self.position..self.limit]
    }

    /// Returns the writable span between position and limit.
    pub fn as_writable_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.position..self.limit]
    }

    const fn check_underflow(&self, requested: usize) -> Result<(), WindowError> {
        let remaining = self.remaining();
        if requested > remaining {
            return Err(WindowError::Underflow {
                requested,
                remaining,
            });
        }
        Ok(())
    }
}
