//! # BMP Header Encoding
//!
//! This module provides the type-safe, zerocopy-based header struct for the
//! canvas file format. The header is exactly 54 bytes: the 14-byte file
//! header and the 40-byte `BITMAPINFOHEADER` laid out as one `#[repr(C)]`
//! struct so it can be written and parsed without intermediate buffers.
//!
//! ## Header Layout
//!
//! ```text
//! Offset  Size  Description
//! 0       2     Signature "BM"
//! 2       4     Total file size (header + pixel data)
//! 6       4     Reserved, zero
//! 10      4     Pixel data offset (54)
//! 14      4     Info header size (40)
//! 18      4     Width in pixels (signed)
//! 22      4     Height in pixels (signed, positive = bottom-up)
//! 26      2     Color planes (1)
//! 28      2     Bits per pixel (24)
//! 30      4     Compression (0 = none)
//! 34      4     Pixel data size (row stride * height)
//! 38      4     Horizontal resolution, pixels/meter
//! 42      4     Vertical resolution, pixels/meter
//! 46      4     Palette size (0)
//! 50      4     Important colors (0)
//! ```
//!
//! ## Zerocopy Safety
//!
//! The struct derives `FromBytes`, `IntoBytes`, `Immutable`, `KnownLayout`
//! and `Unaligned`, so a `&BmpHeader` can be overlaid directly on the first
//! 54 bytes of a file or an uploaded fragment. All multi-byte fields use
//! the `zerocopy` little-endian wrappers, matching the format's mandated
//! endianness regardless of host byte order.

use zerocopy::little_endian::{I32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::geometry::row_stride;
use super::{BIT_DEPTH, INFO_HEADER_SIZE, PIXEL_DATA_OFFSET};
use crate::error::{Result, StorageError};

pub const BMP_MAGIC: &[u8; 2] = b"BM";

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct BmpHeader {
    signature: [u8; 2],
    file_size: U32,
    reserved: U32,
    pixel_offset: U32,
    info_size: U32,
    width: I32,
    height: I32,
    planes: U16,
    bit_depth: U16,
    compression: U32,
    image_size: U32,
    x_pixels_per_meter: I32,
    y_pixels_per_meter: I32,
    palette_size: U32,
    important_colors: U32,
}

const _: () = assert!(std::mem::size_of::<BmpHeader>() == PIXEL_DATA_OFFSET);

impl BmpHeader {
    pub fn new(width: u32, height: u32) -> Self {
        let image_size = row_stride(width) * height as u64;
        Self {
            signature: *BMP_MAGIC,
            file_size: U32::new(PIXEL_DATA_OFFSET as u32 + image_size as u32),
            reserved: U32::new(0),
            pixel_offset: U32::new(PIXEL_DATA_OFFSET as u32),
            info_size: U32::new(INFO_HEADER_SIZE as u32),
            width: I32::new(width as i32),
            height: I32::new(height as i32),
            planes: U16::new(1),
            bit_depth: U16::new(BIT_DEPTH),
            compression: U32::new(0),
            image_size: U32::new(image_size as u32),
            x_pixels_per_meter: I32::new(0),
            y_pixels_per_meter: I32::new(0),
            palette_size: U32::new(0),
            important_colors: U32::new(0),
        }
    }

    /// Parses and validates a header from the first 54 bytes of `bytes`.
    ///
    /// Rejects anything the engine cannot address: missing magic, a bit
    /// depth other than 24, compressed pixel data, or non-positive
    /// dimensions.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        if bytes.len() < PIXEL_DATA_OFFSET {
            return Err(StorageError::corrupt(format!(
                "buffer too small for bitmap header: {} < {}",
                bytes.len(),
                PIXEL_DATA_OFFSET
            )));
        }

        let header = Self::ref_from_bytes(&bytes[..PIXEL_DATA_OFFSET])
            .map_err(|e| StorageError::corrupt(format!("failed to parse bitmap header: {e:?}")))?;

        if &header.signature != BMP_MAGIC {
            return Err(StorageError::corrupt("missing BM signature"));
        }
        if header.bit_depth.get() != BIT_DEPTH {
            return Err(StorageError::corrupt(format!(
                "unsupported bit depth: {} (expected {})",
                header.bit_depth.get(),
                BIT_DEPTH
            )));
        }
        if header.compression.get() != 0 {
            return Err(StorageError::corrupt(format!(
                "compressed pixel data is not supported (compression={})",
                header.compression.get()
            )));
        }
        if header.width.get() < 1 || header.height.get() < 1 {
            return Err(StorageError::corrupt(format!(
                "non-positive dimensions: {}x{}",
                header.width.get(),
                header.height.get()
            )));
        }

        Ok(header)
    }

    pub fn width(&self) -> u32 {
        self.width.get() as u32
    }

    pub fn height(&self) -> u32 {
        self.height.get() as u32
    }

    pub fn file_size(&self) -> u32 {
        self.file_size.get()
    }

    /// Byte offset of the first pixel row. Always 54 for headers produced
    /// by [`BmpHeader::new`], but uploaded fragments may declare a larger
    /// offset and the body must be located through it.
    pub fn pixel_offset(&self) -> u32 {
        self.pixel_offset.get()
    }

    pub fn image_size(&self) -> u32 {
        self.image_size.get()
    }
}
