//! # Canvas Allocation and Deletion
//!
//! Creates canvas files byte-valid in a single pass: header first, then
//! `height` zero rows streamed through a buffered writer so the file never
//! exists in memory as a whole. A failure partway through removes the
//! partial file before the error propagates, so no orphaned corrupt canvas
//! is ever left behind.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter};
use std::path::Path;

use tracing::{debug, warn};
use zerocopy::IntoBytes as _;

use crate::bitmap::geometry::{file_size, row_stride};
use crate::bitmap::BmpHeader;
use crate::error::{Result, StorageError};

/// Creates a new canvas file of `width x height` pixels, pre-filled with
/// the default pixel (black).
///
/// The file must not already exist; a collision is a [`StorageError::Storage`],
/// never a silent overwrite. On success the file size is exactly
/// `54 + row_stride(width) * height`.
pub fn create_canvas(path: &Path, width: u32, height: u32) -> Result<()> {
    if width < 1 || height < 1 {
        return Err(StorageError::invalid(format!(
            "canvas dimensions must be positive, got {width}x{height}"
        )));
    }
    // The header's size fields are 32-bit; a canvas beyond them would
    // wrap in the header while the engine's 64-bit offsets kept going.
    if file_size(width, height) > u64::from(u32::MAX) {
        return Err(StorageError::invalid(format!(
            "canvas {width}x{height} exceeds the format's 32-bit file size"
        )));
    }

    create_with(path, |file| {
        fill_rows(BufWriter::new(file), width, height)?;
        file.sync_all()
    })?;

    debug!(path = %path.display(), width, height, "created canvas");
    Ok(())
}

/// Creates the file at `path` and hands it to `fill`. A `fill` failure
/// removes the partial file before the error propagates, so no orphaned
/// corrupt canvas is left behind.
fn create_with(path: &Path, fill: impl FnOnce(&fs::File) -> io::Result<()>) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            StorageError::storage(
                format!("failed to create canvas file '{}'", path.display()),
                e,
            )
        })?;

    if let Err(e) = fill(&file) {
        // If the removal itself fails there is nothing more to do than
        // report the original error.
        if let Err(rm) = fs::remove_file(path) {
            warn!(
                path = %path.display(),
                error = %rm,
                "failed to remove partially written canvas"
            );
        }
        return Err(StorageError::storage(
            format!("failed to write canvas file '{}'", path.display()),
            e,
        ));
    }

    Ok(())
}

fn fill_rows<W: io::Write>(mut sink: W, width: u32, height: u32) -> io::Result<()> {
    let header = BmpHeader::new(width, height);
    sink.write_all(header.as_bytes())?;

    let zero_row = vec![0u8; row_stride(width) as usize];
    for _ in 0..height {
        sink.write_all(&zero_row)?;
    }

    sink.flush()
}

/// Removes the canvas file at `path`.
///
/// An already-absent file is a successful no-op so that callers holding
/// stale metadata can converge on "deleted" without special-casing.
pub fn delete_canvas(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "deleted canvas");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "canvas file already absent on delete");
            Ok(())
        }
        Err(e) => Err(StorageError::storage(
            format!("failed to delete canvas file '{}'", path.display()),
            e,
        )),
    }
}
