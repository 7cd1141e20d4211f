//! # Canvas Layout Arithmetic
//!
//! Row strides, file offsets, the bottom-up row flip, and rectangle
//! clipping. These are the only functions that translate between the
//! caller's coordinate space (top-left origin, `y` growing downward) and
//! the file's byte space, so both the read and the write path go through
//! them rather than repeating the arithmetic.

use super::{BYTES_PER_PIXEL, PIXEL_DATA_OFFSET, ROW_ALIGN};

/// Byte length of one pixel row: 3 bytes per pixel, rounded up to a
/// 4-byte boundary.
pub fn row_stride(width: u32) -> u64 {
    (width as u64 * BYTES_PER_PIXEL as u64).div_ceil(ROW_ALIGN as u64) * ROW_ALIGN as u64
}

/// Maps a top-down row index to the bottom-up storage row index.
///
/// `row` must be `< height`.
pub fn file_row(height: u32, row: u32) -> u32 {
    debug_assert!(row < height);
    height - 1 - row
}

/// Byte offset of a bottom-up storage row within the canvas file.
pub fn row_offset(canvas_width: u32, file_row: u32) -> u64 {
    PIXEL_DATA_OFFSET as u64 + file_row as u64 * row_stride(canvas_width)
}

/// Total byte size of a canvas file with the given dimensions.
pub fn file_size(width: u32, height: u32) -> u64 {
    PIXEL_DATA_OFFSET as u64 + row_stride(width) * height as u64
}

/// A requested fragment rectangle in canvas space.
///
/// The origin is signed: rectangles may start above or left of the canvas
/// and are clipped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersects the rectangle with `[0, canvas_width) x [0, canvas_height)`.
    ///
    /// Returns `None` when the intersection is empty. The `skip_x`/`skip_y`
    /// fields of the result give the position of the intersection inside
    /// the requested rectangle, which is what fragment I/O needs to line
    /// up source and destination rows.
    pub fn clip(&self, canvas_width: u32, canvas_height: u32) -> Option<ClippedRect> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width as i64).min(canvas_width as i64);
        let y1 = (self.y + self.height as i64).min(canvas_height as i64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(ClippedRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
            skip_x: (x0 - self.x) as u32,
            skip_y: (y0 - self.y) as u32,
        })
    }
}

/// The in-bounds part of a requested rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClippedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Columns of the requested rectangle that fell off the left edge.
    pub skip_x: u32,
    /// Rows of the requested rectangle that fell off the top edge.
    pub skip_y: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_padded_to_four_bytes() {
        for width in 1..=64 {
            let stride = row_stride(width);
            assert_eq!(stride % 4, 0, "width {width}");
            assert!(stride >= width as u64 * 3, "width {width}");
            assert_eq!(stride == width as u64 * 3, width as u64 * 3 % 4 == 0);
        }
    }

    #[test]
    fn stride_known_values() {
        assert_eq!(row_stride(1), 4);
        assert_eq!(row_stride(2), 8);
        assert_eq!(row_stride(4), 12);
        assert_eq!(row_stride(51), 156);
    }

    #[test]
    fn file_row_flips_top_down_to_bottom_up() {
        assert_eq!(file_row(102, 0), 101);
        assert_eq!(file_row(102, 101), 0);
        assert_eq!(file_row(1, 0), 0);
    }

    #[test]
    fn row_offset_steps_by_stride() {
        assert_eq!(row_offset(51, 0), 54);
        assert_eq!(row_offset(51, 1), 54 + 156);
        assert_eq!(row_offset(51, 101), 54 + 101 * 156);
    }

    #[test]
    fn file_size_scenario() {
        assert_eq!(file_size(51, 102), 16_066);
        assert_eq!(file_size(1, 1), 58);
    }

    #[test]
    fn clip_interior_rect_is_unchanged() {
        let clip = Rect::new(3, 4, 10, 5).clip(100, 100).unwrap();

        assert_eq!(clip.x, 3);
        assert_eq!(clip.y, 4);
        assert_eq!(clip.width, 10);
        assert_eq!(clip.height, 5);
        assert_eq!(clip.skip_x, 0);
        assert_eq!(clip.skip_y, 0);
    }

    #[test]
    fn clip_negative_origin_skips_rows_and_columns() {
        let clip = Rect::new(-3, -2, 10, 5).clip(100, 100).unwrap();

        assert_eq!(clip.x, 0);
        assert_eq!(clip.y, 0);
        assert_eq!(clip.width, 7);
        assert_eq!(clip.height, 3);
        assert_eq!(clip.skip_x, 3);
        assert_eq!(clip.skip_y, 2);
    }

    #[test]
    fn clip_trims_right_and_bottom_overhang() {
        let clip = Rect::new(95, 98, 10, 5).clip(100, 100).unwrap();

        assert_eq!(clip.x, 95);
        assert_eq!(clip.y, 98);
        assert_eq!(clip.width, 5);
        assert_eq!(clip.height, 2);
        assert_eq!(clip.skip_x, 0);
        assert_eq!(clip.skip_y, 0);
    }

    #[test]
    fn clip_outside_canvas_is_empty() {
        assert!(Rect::new(100, 0, 10, 10).clip(100, 100).is_none());
        assert!(Rect::new(0, -10, 10, 10).clip(100, 100).is_none());
        assert!(Rect::new(-10, -10, 10, 10).clip(100, 100).is_none());
    }
}
