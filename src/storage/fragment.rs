//! # Fragment Region I/O
//!
//! Row-by-row seek+read / seek+write of rectangular canvas regions. Both
//! paths share the same shape: clip the requested rectangle to canvas
//! bounds, then for each overlapping row map the top-down request row to
//! the file's bottom-up row, seek to `row_offset + x * 3`, and transfer
//! exactly `clip_width * 3` bytes. Row padding and pixels outside the
//! rectangle are never touched.
//!
//! Writes are best-effort at row granularity: a failure at row `k` leaves
//! rows `0..k` durable and is reported, not rolled back. Reads always
//! honor the requested output shape; clipped-away pixels come back as the
//! default (black).

use std::fs::OpenOptions;
use std::io::{Read as _, Seek as _, SeekFrom, Write as _};
use std::path::Path;

use tracing::debug;
use zerocopy::IntoBytes as _;

use crate::bitmap::geometry::{file_row, row_offset, row_stride};
use crate::bitmap::{BmpHeader, Rect, BYTES_PER_PIXEL, PIXEL_DATA_OFFSET};
use crate::error::{Result, StorageError};

use super::check_canvas_size;

/// Overwrites the part of `rect` that lies inside the canvas with pixel
/// data from `body`.
///
/// `body` is a bare BMP pixel body for a `rect.width x rect.height` image:
/// bottom-up rows of `row_stride(rect.width)` bytes. Portions of `rect`
/// outside the canvas are silently dropped; an empty intersection is a
/// successful no-op.
pub fn write_fragment(
    path: &Path,
    canvas_width: u32,
    canvas_height: u32,
    rect: Rect,
    body: &[u8],
) -> Result<()> {
    if rect.width < 1 || rect.height < 1 {
        return Err(StorageError::invalid(format!(
            "fragment dimensions must be positive, got {}x{}",
            rect.width, rect.height
        )));
    }

    let src_stride = row_stride(rect.width);
    let required = src_stride * rect.height as u64;
    if (body.len() as u64) < required {
        return Err(StorageError::invalid(format!(
            "fragment body is {} bytes, need {} for {}x{}",
            body.len(),
            required,
            rect.width,
            rect.height
        )));
    }

    let Some(clip) = rect.clip(canvas_width, canvas_height) else {
        debug!(?rect, canvas_width, canvas_height, "write outside canvas, nothing to do");
        return Ok(());
    };

    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| {
            StorageError::storage(
                format!("failed to open canvas file '{}'", path.display()),
                e,
            )
        })?;
    check_canvas_size(&file, path, canvas_width, canvas_height)?;

    let span = clip.width as u64 * BYTES_PER_PIXEL as u64;
    for r in 0..clip.height {
        let src_row = file_row(rect.height, clip.skip_y + r);
        let src_start = src_row as u64 * src_stride + clip.skip_x as u64 * BYTES_PER_PIXEL as u64;
        let src = &body[src_start as usize..(src_start + span) as usize];

        let dst_row = file_row(canvas_height, clip.y + r);
        let dst_offset = row_offset(canvas_width, dst_row) + clip.x as u64 * BYTES_PER_PIXEL as u64;

        file.seek(SeekFrom::Start(dst_offset))
            .and_then(|_| file.write_all(src))
            .map_err(|e| {
                StorageError::storage(
                    format!(
                        "failed to write row {} of fragment to '{}'",
                        clip.y + r,
                        path.display()
                    ),
                    e,
                )
            })?;
    }

    debug!(?rect, ?clip, path = %path.display(), "wrote fragment");
    Ok(())
}

/// Reads the rectangle `rect` from the canvas and returns it as a complete
/// BMP file (header + pixel body).
///
/// The output is always exactly `rect.width x rect.height`: the part of
/// the rectangle inside the canvas carries the stored pixels, everything
/// else is default-filled. A rectangle fully outside the canvas yields an
/// all-default image, not an error.
pub fn read_fragment(
    path: &Path,
    canvas_width: u32,
    canvas_height: u32,
    rect: Rect,
) -> Result<Vec<u8>> {
    if rect.width < 1 || rect.height < 1 {
        return Err(StorageError::invalid(format!(
            "fragment dimensions must be positive, got {}x{}",
            rect.width, rect.height
        )));
    }

    let out_stride = row_stride(rect.width);
    let body_len = out_stride * rect.height as u64;
    let mut out = Vec::with_capacity(PIXEL_DATA_OFFSET + body_len as usize);
    out.extend_from_slice(BmpHeader::new(rect.width, rect.height).as_bytes());
    out.resize(PIXEL_DATA_OFFSET + body_len as usize, 0);

    let Some(clip) = rect.clip(canvas_width, canvas_height) else {
        debug!(?rect, canvas_width, canvas_height, "read outside canvas, default-filled");
        return Ok(out);
    };

    let mut file = OpenOptions::new().read(true).open(path).map_err(|e| {
        StorageError::storage(
            format!("failed to open canvas file '{}'", path.display()),
            e,
        )
    })?;
    check_canvas_size(&file, path, canvas_width, canvas_height)?;

    let span = clip.width as u64 * BYTES_PER_PIXEL as u64;
    for r in 0..clip.height {
        let src_row = file_row(canvas_height, clip.y + r);
        let src_offset = row_offset(canvas_width, src_row) + clip.x as u64 * BYTES_PER_PIXEL as u64;

        let dst_row = file_row(rect.height, clip.skip_y + r);
        let dst_start = PIXEL_DATA_OFFSET as u64
            + dst_row as u64 * out_stride
            + clip.skip_x as u64 * BYTES_PER_PIXEL as u64;
        let dst = &mut out[dst_start as usize..(dst_start + span) as usize];

        file.seek(SeekFrom::Start(src_offset))
            .and_then(|_| file.read_exact(dst))
            .map_err(|e| {
                StorageError::storage(
                    format!(
                        "failed to read row {} of fragment from '{}'",
                        clip.y + r,
                        path.display()
                    ),
                    e,
                )
            })?;
    }

    debug!(?rect, ?clip, path = %path.display(), "read fragment");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::allocator::create_canvas;
    use tempfile::tempdir;

    /// Builds a bare pixel body for a `width x height` fragment where the
    /// pixel at top-down `(col, row)` is `(b, g, r) = (col, row, marker)`.
    fn test_body(width: u32, height: u32, marker: u8) -> Vec<u8> {
        let stride = row_stride(width) as usize;
        let mut body = vec![0u8; stride * height as usize];
        for row in 0..height {
            let base = file_row(height, row) as usize * stride;
            for col in 0..width {
                let px = base + col as usize * 3;
                body[px] = col as u8;
                body[px + 1] = row as u8;
                body[px + 2] = marker;
            }
        }
        body
    }

    #[test]
    fn write_then_read_is_identity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.bmp");
        create_canvas(&path, 51, 102).unwrap();

        let rect = Rect::new(5, 9, 31, 26);
        let body = test_body(31, 26, 0xAB);
        write_fragment(&path, 51, 102, rect, &body).unwrap();

        let read = read_fragment(&path, 51, 102, rect).unwrap();
        assert_eq!(&read[PIXEL_DATA_OFFSET..], &body[..]);
    }

    #[test]
    fn write_rejects_undersized_body() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.bmp");
        create_canvas(&path, 10, 10).unwrap();

        let body = test_body(4, 4, 1);
        let result = write_fragment(&path, 10, 10, Rect::new(0, 0, 8, 8), &body);

        assert!(matches!(result, Err(StorageError::InvalidArgument(_))));
    }

    #[test]
    fn write_outside_canvas_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.bmp");
        create_canvas(&path, 10, 10).unwrap();
        let before = std::fs::read(&path).unwrap();

        let body = test_body(4, 4, 1);
        write_fragment(&path, 10, 10, Rect::new(10, 10, 4, 4), &body).unwrap();
        write_fragment(&path, 10, 10, Rect::new(-4, 0, 4, 4), &body).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn clipped_write_only_touches_overlap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.bmp");
        create_canvas(&path, 8, 8).unwrap();

        // Hangs two columns off the right edge and two rows off the bottom.
        let body = test_body(4, 4, 0xCC);
        write_fragment(&path, 8, 8, Rect::new(6, 6, 4, 4), &body).unwrap();

        let full = read_fragment(&path, 8, 8, Rect::new(0, 0, 8, 8)).unwrap();
        let stride = row_stride(8) as usize;
        for row in 0..8u32 {
            for col in 0..8u32 {
                let base = PIXEL_DATA_OFFSET + file_row(8, row) as usize * stride;
                let px = &full[base + col as usize * 3..base + col as usize * 3 + 3];
                if row >= 6 && col >= 6 {
                    assert_eq!(px, [(col - 6) as u8, (row - 6) as u8, 0xCC]);
                } else {
                    assert_eq!(px, [0, 0, 0], "pixel ({col},{row}) must stay default");
                }
            }
        }
    }

    #[test]
    fn out_of_bounds_read_is_default_filled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.bmp");
        create_canvas(&path, 6, 6).unwrap();

        let body = test_body(6, 6, 0x7F);
        write_fragment(&path, 6, 6, Rect::new(0, 0, 6, 6), &body).unwrap();

        // Straddles the bottom-right corner: only the top-left quarter of
        // the request is inside the canvas.
        let out = read_fragment(&path, 6, 6, Rect::new(4, 4, 4, 4)).unwrap();
        let stride = row_stride(4) as usize;
        for row in 0..4u32 {
            for col in 0..4u32 {
                let base = PIXEL_DATA_OFFSET + file_row(4, row) as usize * stride;
                let px = &out[base + col as usize * 3..base + col as usize * 3 + 3];
                if row < 2 && col < 2 {
                    assert_eq!(px, [(col + 4) as u8, (row + 4) as u8, 0x7F]);
                } else {
                    assert_eq!(px, [0, 0, 0]);
                }
            }
        }
    }

    #[test]
    fn read_fully_outside_returns_blank_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.bmp");
        create_canvas(&path, 6, 6).unwrap();

        let out = read_fragment(&path, 6, 6, Rect::new(100, 100, 3, 3)).unwrap();

        let header = BmpHeader::from_bytes(&out).unwrap();
        assert_eq!(header.width(), 3);
        assert_eq!(header.height(), 3);
        assert!(out[PIXEL_DATA_OFFSET..].iter().all(|&b| b == 0));
    }

    #[test]
    fn read_output_is_a_valid_bmp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.bmp");
        create_canvas(&path, 20, 20).unwrap();

        let out = read_fragment(&path, 20, 20, Rect::new(3, 3, 7, 5)).unwrap();

        let header = BmpHeader::from_bytes(&out).unwrap();
        assert_eq!(header.width(), 7);
        assert_eq!(header.height(), 5);
        assert_eq!(out.len() as u64, u64::from(header.file_size()));
    }

    #[test]
    fn mismatched_file_size_is_reported_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.bmp");
        create_canvas(&path, 6, 6).unwrap();

        // Declared dimensions disagree with the file on disk.
        let result = read_fragment(&path, 7, 6, Rect::new(0, 0, 2, 2));
        assert!(matches!(result, Err(StorageError::FormatCorrupt(_))));

        let body = test_body(2, 2, 1);
        let result = write_fragment(&path, 7, 6, Rect::new(0, 0, 2, 2), &body);
        assert!(matches!(result, Err(StorageError::FormatCorrupt(_))));
    }

    #[test]
    fn padding_bytes_survive_fragment_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.bmp");
        // Width 2: stride 8, two padding bytes per row.
        create_canvas(&path, 2, 2).unwrap();

        let body = test_body(2, 2, 0xEE);
        write_fragment(&path, 2, 2, Rect::new(0, 0, 2, 2), &body).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let stride = row_stride(2) as usize;
        for row in 0..2 {
            let base = PIXEL_DATA_OFFSET + row * stride;
            assert_eq!(&bytes[base + 6..base + 8], [0, 0], "row {row} padding");
        }
    }
}
