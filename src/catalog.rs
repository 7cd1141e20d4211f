//! # Canvas Metadata Catalog
//!
//! The engine never keeps its own index of canvases; every operation is
//! parameterized by path and dimensions resolved from a metadata store.
//! [`MetadataStore`] is that seam. [`MemoryCatalog`] is the in-process
//! implementation the service layer and tests use; a deployment backed by
//! a relational store plugs in behind the same trait.

use std::path::PathBuf;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::{Result, StorageError};

/// Everything the engine needs to know about one canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasMeta {
    pub id: u64,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

pub trait MetadataStore: Send + Sync {
    /// Records a new canvas and assigns its id.
    fn persist(&self, path: PathBuf, width: u32, height: u32) -> Result<u64>;

    /// Looks up a canvas by id. [`StorageError::NotFound`] for unknown ids.
    fn resolve(&self, id: u64) -> Result<CanvasMeta>;

    /// Drops the metadata for a canvas. [`StorageError::NotFound`] for
    /// unknown ids, so a double delete surfaces at the metadata layer.
    fn forget(&self, id: u64) -> Result<()>;
}

/// In-memory catalog with monotonically increasing ids.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: RwLock<CatalogInner>,
}

#[derive(Debug, Default)]
struct CatalogInner {
    next_id: u64,
    canvases: HashMap<u64, CanvasMeta>,
}

impl MemoryCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.inner.read().canvases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().canvases.is_empty()
    }
}

impl MetadataStore for MemoryCatalog {
    fn persist(&self, path: PathBuf, width: u32, height: u32) -> Result<u64> {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.canvases.insert(
            id,
            CanvasMeta {
                id,
                path,
                width,
                height,
            },
        );
        Ok(id)
    }

    fn resolve(&self, id: u64) -> Result<CanvasMeta> {
        self.inner
            .read()
            .canvases
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    fn forget(&self, id: u64) -> Result<()> {
        self.inner
            .write()
            .canvases
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_assigns_increasing_ids() {
        let catalog = MemoryCatalog::new();

        let a = catalog.persist("a.bmp".into(), 10, 10).unwrap();
        let b = catalog.persist("b.bmp".into(), 20, 20).unwrap();

        assert!(b > a);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn resolve_returns_persisted_meta() {
        let catalog = MemoryCatalog::new();
        let id = catalog.persist("c.bmp".into(), 51, 102).unwrap();

        let meta = catalog.resolve(id).unwrap();
        assert_eq!(meta.id, id);
        assert_eq!(meta.path, PathBuf::from("c.bmp"));
        assert_eq!(meta.width, 51);
        assert_eq!(meta.height, 102);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let catalog = MemoryCatalog::new();

        assert!(matches!(
            catalog.resolve(999),
            Err(StorageError::NotFound(999))
        ));
        assert!(matches!(
            catalog.forget(999),
            Err(StorageError::NotFound(999))
        ));
    }

    #[test]
    fn forget_removes_the_canvas() {
        let catalog = MemoryCatalog::new();
        let id = catalog.persist("d.bmp".into(), 4, 4).unwrap();

        catalog.forget(id).unwrap();

        assert!(catalog.is_empty());
        assert!(matches!(catalog.resolve(id), Err(StorageError::NotFound(_))));
    }
}
