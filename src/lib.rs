//! # charta - Canvas Fragment Storage Engine
//!
//! charta stores large raster canvases as uncompressed 24-bit BMP files
//! and performs exact, bounds-safe, random-access reads and writes of
//! rectangular sub-regions directly against the file, without ever
//! materializing a whole canvas in memory.
//!
//! ## Quick Start
//!
//! ```ignore
//! use charta::{CanvasService, Limits, Rect};
//!
//! let service = CanvasService::builder()
//!     .root("./canvases")
//!     .build()?;
//!
//! let id = service.create_canvas(51, 102)?;
//! service.save_fragment(id, Rect::new(0, 0, 31, 26), &uploaded_bmp)?;
//! let bmp = service.get_fragment(id, Rect::new(0, 0, 31, 26))?;
//! service.delete_canvas(id)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Service (limits, locks, naming)    │
//! ├───────────────────┬─────────────────┤
//! │  Catalog (id map) │  Storage Engine  │
//! ├───────────────────┴─────────────────┤
//! │     Bitmap Codec (pure layout)       │
//! └─────────────────────────────────────┘
//! ```
//!
//! The storage engine is stateless: every call receives the canvas path
//! and dimensions explicitly, opens its own file handle, and releases it
//! before returning. Rectangles that overhang the canvas are clipped,
//! never errors: writes touch only the overlap, reads default-fill the
//! part outside the canvas.
//!
//! ## Module Overview
//!
//! - [`bitmap`]: header encoding, row strides, the bottom-up row flip,
//!   rectangle clipping
//! - [`storage`]: canvas allocation, fragment region I/O, deletion
//! - [`catalog`]: the id -> (path, width, height) metadata seam
//! - [`service`]: validation, per-canvas locking, orchestration

pub mod bitmap;
pub mod catalog;
pub mod error;
pub mod service;
pub mod storage;

pub use bitmap::{BmpHeader, Rect};
pub use catalog::{CanvasMeta, MemoryCatalog, MetadataStore};
pub use error::{Result, StorageError};
pub use service::{CanvasService, Limits};
