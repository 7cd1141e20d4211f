//! # Canvas Storage Engine
//!
//! Stateless, blocking file I/O against canvas files. The engine holds no
//! registry of canvases and caches no file handles: every call is fully
//! parameterized by the path and the declared dimensions the caller keeps
//! in its own metadata store, opens its own handle, and releases it on
//! every exit path.
//!
//! ## Memory Model
//!
//! A canvas can be far larger than available memory, so nothing here ever
//! holds more than one row span at a time. Allocation streams zero rows
//! through a buffered writer; fragment reads and writes seek to each
//! affected row and touch only the `width * 3` bytes of the overlap.
//!
//! ## Concurrency
//!
//! Row writes are not atomic across a rectangle: a failure at row `k`
//! leaves rows `0..k` written. Callers must serialize operations that
//! touch overlapping regions of the same canvas: one write lock per
//! canvas id, reads concurrent with reads but not with writes. The
//! [`crate::service`] layer implements exactly that.
//!
//! ## Module Organization
//!
//! - `allocator`: canvas file creation and deletion
//! - `fragment`: rectangular region reads and writes

pub mod allocator;
pub mod fragment;

pub use allocator::{create_canvas, delete_canvas};
pub use fragment::{read_fragment, write_fragment};

use std::fs::File;
use std::path::Path;

use crate::bitmap::geometry;
use crate::error::{Result, StorageError};

/// Checks that an opened canvas file has exactly the size its declared
/// dimensions imply. Catches truncated or foreign files before any row
/// arithmetic trusts the declared layout.
fn check_canvas_size(file: &File, path: &Path, width: u32, height: u32) -> Result<()> {
    let actual = file
        .metadata()
        .map_err(|e| {
            StorageError::storage(
                format!("failed to stat canvas file '{}'", path.display()),
                e,
            )
        })?
        .len();

    let expected = geometry::file_size(width, height);
    if actual != expected {
        return Err(StorageError::corrupt(format!(
            "canvas file '{}' is {} bytes, expected {} for {}x{}",
            path.display(),
            actual,
            expected,
            width,
            height
        )));
    }

    Ok(())
}
