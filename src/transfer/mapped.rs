//! Memory-mapped file copy.

// Memory mapping requires unsafe; the maps never outlive the endpoints
// that own the files.
#![allow(unsafe_code)]

use crate::endpoint::{Endpoint, FileEndpoint};
use crate::error::{EndpointError, Result, TransferError};
use memmap2::{Mmap, MmapMut};
use tracing::debug;

/// Copies the whole of `source` into `sink` through memory mappings.
///
/// The sink is resized to the source length, mapped read-write, and filled
/// from a read-only mapping of the source. Returns the number of bytes
/// copied.
///
/// # Errors
///
/// Returns [`EndpointError::InvalidMode`] unless the sink was opened
/// `READ | WRITE`, [`TransferError::SizeMismatch`] if the source cannot be
/// mapped on this platform, and [`EndpointError::Io`] if mapping or
/// flushing fails.
pub fn copy_mapped(source: &FileEndpoint, sink: &mut FileEndpoint) -> Result<u64> {
    source.ensure_open()?;
    sink.ensure_open()?;
    if !source.mode().is_readable() {
        return Err(source.unsupported("copy_mapped"));
    }
    let sink_mode = sink.mode();
    if !(sink_mode.is_readable() && sink_mode.is_writable()) {
        return Err(EndpointError::InvalidMode {
            mode: format!("{sink_mode} (mapped sink needs READ|WRITE)"),
        }
        .into());
    }

    let size = source.size()?;
    if usize::try_from(size).is_err() {
        return Err(TransferError::SizeMismatch { size }.into());
    }
    sink.truncate(size)?;
    if size == 0 {
        return Ok(0);
    }

    // Safety: the source map is read-only and both files stay open for the
    // lifetime of the maps.
    let input = unsafe { Mmap::map(source.handle()?) }
        .map_err(|e| EndpointError::io(source.name(), e))?;
    let mut output = unsafe { MmapMut::map_mut(sink.handle()?) }
        .map_err(|e| EndpointError::io(sink.name(), e))?;

    output.copy_from_slice(&input);
    output.flush().map_err(|e| EndpointError::io(sink.name(), e))?;

    debug!(
        source = %source.name(),
        sink = %sink.name(),
        bytes = size,
        "mapped copy complete"
    );
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::OpenMode;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn test_copy_mapped() {
        let temp_dir = TempDir::new().unwrap();
        let src_path = temp_dir.path().join("1.jpg");
        let dst_path = temp_dir.path().join("3.jpg");
        let payload: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
        std::fs::write(&src_path, &payload).unwrap();

        let source = FileEndpoint::open(&src_path, OpenMode::READ).unwrap();
        let mut sink = FileEndpoint::open(
            &dst_path,
            OpenMode::READ | OpenMode::WRITE | OpenMode::CREATE,
        )
        .unwrap();

        assert_eq!(copy_mapped(&source, &mut sink).unwrap(), 70_000);
        drop(sink);
        assert_eq!(std::fs::read(&dst_path).unwrap(), payload);
    }

    #[test]
    fn test_copy_mapped_shrinks_sink() {
        let temp_dir = TempDir::new().unwrap();
        let src_path = temp_dir.path().join("small.bin");
        let dst_path = temp_dir.path().join("big.bin");
        std::fs::write(&src_path, b"tiny").unwrap();
        std::fs::write(&dst_path, vec![9u8; 4096]).unwrap();

        let source = FileEndpoint::open(&src_path, OpenMode::READ).unwrap();
        let mut sink = FileEndpoint::open(&dst_path, OpenMode::READ | OpenMode::WRITE).unwrap();
        copy_mapped(&source, &mut sink).unwrap();
        drop(sink);
        assert_eq!(std::fs::read(&dst_path).unwrap(), b"tiny");
    }

    #[test]
    fn test_copy_mapped_empty_source() {
        let temp_dir = TempDir::new().unwrap();
        let src_path = temp_dir.path().join("empty.bin");
        let dst_path = temp_dir.path().join("out.bin");
        std::fs::write(&src_path, b"").unwrap();

        let source = FileEndpoint::open(&src_path, OpenMode::READ).unwrap();
        let mut sink = FileEndpoint::open(
            &dst_path,
            OpenMode::READ | OpenMode::WRITE | OpenMode::CREATE,
        )
        .unwrap();
        assert_eq!(copy_mapped(&source, &mut sink).unwrap(), 0);
    }

    #[test]
    fn test_copy_mapped_requires_read_write_sink() {
        let temp_dir = TempDir::new().unwrap();
        let src_path = temp_dir.path().join("src.bin");
        let dst_path = temp_dir.path().join("dst.bin");
        std::fs::write(&src_path, b"data").unwrap();

        let source = FileEndpoint::open(&src_path, OpenMode::READ).unwrap();
        let mut sink =
            FileEndpoint::open(&dst_path, OpenMode::WRITE | OpenMode::CREATE).unwrap();
        let err = copy_mapped(&source, &mut sink).unwrap_err();
        assert!(matches!(
            err,
            Error::Endpoint(EndpointError::InvalidMode { .. })
        ));
    }
}
