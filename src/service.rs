//! # Canvas Service
//!
//! Orchestration above the stateless engine: dimension validation against
//! configured limits, canvas file naming and directory provisioning,
//! metadata persistence, and the per-canvas locking the engine's contract
//! requires. This is the layer a request handler talks to; everything
//! below it is parameterized by explicit paths and dimensions.
//!
//! ## Locking
//!
//! The engine's row writes are not atomic across a rectangle, so the
//! service keeps one `RwLock` per canvas id: fragment reads of a canvas
//! run concurrently, fragment writes and deletes are exclusive. Locks for
//! deleted canvases are dropped with the canvas.
//!
//! ## Usage
//!
//! ```ignore
//! let service = CanvasService::builder()
//!     .root("./canvases")
//!     .limits(Limits::default())
//!     .build()?;
//!
//! let id = service.create_canvas(51, 102)?;
//! service.save_fragment(id, Rect::new(0, 0, 31, 26), &upload)?;
//! let bmp = service.get_fragment(id, Rect::new(0, 0, 31, 26))?;
//! service.delete_canvas(id)?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use eyre::{ensure, Result, WrapErr};
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::bitmap::{BmpHeader, Rect};
use crate::catalog::{MemoryCatalog, MetadataStore};
use crate::error::StorageError;
use crate::storage;

/// Configured maxima for canvas and fragment dimensions.
///
/// Requests beyond these are rejected before any file I/O happens. The
/// defaults match the original deployment profile: canvases up to
/// 20000x50000, fragments up to 5000x5000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_canvas_width: u32,
    pub max_canvas_height: u32,
    pub max_fragment_width: u32,
    pub max_fragment_height: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_canvas_width: 20_000,
            max_canvas_height: 50_000,
            max_fragment_width: 5_000,
            max_fragment_height: 5_000,
        }
    }
}

pub struct CanvasService {
    root: PathBuf,
    limits: Limits,
    store: Arc<dyn MetadataStore>,
    locks: Mutex<HashMap<u64, Arc<RwLock<()>>>>,
    file_seq: AtomicU64,
}

/// Builder for configuring a [`CanvasService`].
pub struct CanvasServiceBuilder {
    root: Option<PathBuf>,
    limits: Limits,
    store: Option<Arc<dyn MetadataStore>>,
}

impl Default for CanvasServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasServiceBuilder {
    pub fn new() -> Self {
        Self {
            root: None,
            limits: Limits::default(),
            store: None,
        }
    }

    /// Directory canvas files are created under. Created on `build()` if
    /// it does not exist. Required.
    pub fn root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Metadata store to resolve canvas ids through. Defaults to a fresh
    /// [`MemoryCatalog`].
    pub fn store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<CanvasService> {
        let root = self.root.ok_or_else(|| eyre::eyre!("root directory is required"))?;

        fs::create_dir_all(&root)
            .wrap_err_with(|| format!("failed to create canvas directory '{}'", root.display()))?;

        Ok(CanvasService {
            root,
            limits: self.limits,
            store: self.store.unwrap_or_else(|| MemoryCatalog::new()),
            locks: Mutex::new(HashMap::new()),
            file_seq: AtomicU64::new(0),
        })
    }
}

impl CanvasService {
    pub fn builder() -> CanvasServiceBuilder {
        CanvasServiceBuilder::new()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Creates a new canvas and returns its id.
    ///
    /// The file is allocated first and metadata persisted once allocation
    /// succeeded; if persistence fails the freshly allocated file is
    /// removed so the two stores cannot drift apart.
    pub fn create_canvas(&self, width: u32, height: u32) -> Result<u64> {
        ensure!(
            width >= 1 && width <= self.limits.max_canvas_width,
            StorageError::invalid(format!(
                "canvas width {} out of range 1..={}",
                width, self.limits.max_canvas_width
            ))
        );
        ensure!(
            height >= 1 && height <= self.limits.max_canvas_height,
            StorageError::invalid(format!(
                "canvas height {} out of range 1..={}",
                height, self.limits.max_canvas_height
            ))
        );

        let path = self.root.join(self.next_file_name());
        storage::create_canvas(&path, width, height)
            .wrap_err("canvas allocation failed")?;

        let id = match self.store.persist(path.clone(), width, height) {
            Ok(id) => id,
            Err(e) => {
                let _ = fs::remove_file(&path);
                return Err(e).wrap_err("failed to persist canvas metadata");
            }
        };

        debug!(id, width, height, path = %path.display(), "created canvas");
        Ok(id)
    }

    /// Writes an uploaded BMP fragment into the canvas rectangle `rect`.
    ///
    /// `bmp` is a complete BMP file; its header must declare exactly
    /// `rect.width x rect.height` and its body is taken from the header's
    /// declared pixel offset.
    pub fn save_fragment(&self, id: u64, rect: Rect, bmp: &[u8]) -> Result<()> {
        self.validate_fragment(rect)?;
        let meta = self.store.resolve(id)?;

        let header = BmpHeader::from_bytes(bmp)?;
        ensure!(
            header.width() == rect.width && header.height() == rect.height,
            StorageError::invalid(format!(
                "fragment is {}x{} but rectangle is {}x{}",
                header.width(),
                header.height(),
                rect.width,
                rect.height
            ))
        );
        let body_start = header.pixel_offset() as usize;
        ensure!(
            body_start <= bmp.len(),
            StorageError::corrupt(format!(
                "pixel offset {} beyond fragment of {} bytes",
                body_start,
                bmp.len()
            ))
        );

        let lock = self.canvas_lock(id);
        let _guard = lock.write();
        storage::write_fragment(&meta.path, meta.width, meta.height, rect, &bmp[body_start..])
            .wrap_err_with(|| format!("failed to save fragment to canvas {id}"))?;

        debug!(id, ?rect, "saved fragment");
        Ok(())
    }

    /// Reads the canvas rectangle `rect` back as a complete BMP file.
    pub fn get_fragment(&self, id: u64, rect: Rect) -> Result<Vec<u8>> {
        self.validate_fragment(rect)?;
        let meta = self.store.resolve(id)?;

        let lock = self.canvas_lock(id);
        let _guard = lock.read();
        let bmp = storage::read_fragment(&meta.path, meta.width, meta.height, rect)
            .wrap_err_with(|| format!("failed to read fragment from canvas {id}"))?;

        debug!(id, ?rect, bytes = bmp.len(), "read fragment");
        Ok(bmp)
    }

    /// Deletes the canvas file and forgets its metadata.
    pub fn delete_canvas(&self, id: u64) -> Result<()> {
        let meta = self.store.resolve(id)?;

        let lock = self.canvas_lock(id);
        {
            let _guard = lock.write();
            storage::delete_canvas(&meta.path)
                .wrap_err_with(|| format!("failed to delete canvas {id}"))?;
            self.store.forget(id)?;
        }
        self.locks.lock().remove(&id);

        debug!(id, "deleted canvas");
        Ok(())
    }

    fn validate_fragment(&self, rect: Rect) -> Result<()> {
        ensure!(
            rect.width >= 1 && rect.width <= self.limits.max_fragment_width,
            StorageError::invalid(format!(
                "fragment width {} out of range 1..={}",
                rect.width, self.limits.max_fragment_width
            ))
        );
        ensure!(
            rect.height >= 1 && rect.height <= self.limits.max_fragment_height,
            StorageError::invalid(format!(
                "fragment height {} out of range 1..={}",
                rect.height, self.limits.max_fragment_height
            ))
        );
        Ok(())
    }

    fn canvas_lock(&self, id: u64) -> Arc<RwLock<()>> {
        Arc::clone(
            self.locks
                .lock()
                .entry(id)
                .or_insert_with(|| Arc::new(RwLock::new(()))),
        )
    }

    /// Canvas file names are independent of catalog ids: the id is only
    /// assigned once the file exists.
    fn next_file_name(&self) -> String {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let seq = self.file_seq.fetch_add(1, Ordering::Relaxed);
        format!("canvas-{stamp:x}-{seq}.bmp")
    }
}
