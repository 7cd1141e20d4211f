//! # Bitmap Format Codec
//!
//! Pure layout arithmetic and header encoding for the uncompressed 24-bit
//! BMP container. Nothing in this module performs I/O; it only computes
//! byte layouts that the [`crate::storage`] engine then seeks against.
//!
//! ## File Layout
//!
//! ```text
//! Offset  Size       Description
//! 0       14         File header: "BM", file size, reserved, pixel offset
//! 14      40         Info header: width, height, planes, depth, compression
//! 54      stride*h   Pixel rows, bottom-up, each padded to 4 bytes
//! ```
//!
//! All multi-byte fields are little-endian. Pixels are 3 bytes each in
//! blue, green, red channel order. A row occupies
//! `ceil(width * 3 / 4) * 4` bytes; the trailing padding is zero on
//! freshly allocated canvases and is never touched by fragment writes.
//!
//! ## Row Order
//!
//! The request convention is top-left origin with `y` growing downward;
//! the file stores rows bottom-up. The flip lives in one place,
//! [`geometry::file_row`], so read and write paths share the arithmetic.

pub mod geometry;
pub mod header;

pub use geometry::{ClippedRect, Rect};
pub use header::BmpHeader;

pub const FILE_HEADER_SIZE: usize = 14;
pub const INFO_HEADER_SIZE: usize = 40;
pub const PIXEL_DATA_OFFSET: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
pub const BYTES_PER_PIXEL: usize = 3;
pub const ROW_ALIGN: usize = 4;
pub const BIT_DEPTH: u16 = 24;
