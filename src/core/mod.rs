//! Core byte-window model for chanio.
//!
//! Holds the cursor-managed [`ByteWindow`] that every endpoint reads into
//! and writes from. This module has no I/O dependencies.

pub mod window;

pub use window::{ByteWindow, WindowSnapshot};
