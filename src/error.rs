//! # Error Taxonomy
//!
//! All fallible operations in the engine return [`StorageError`]. The
//! variants mirror the failure classes callers are expected to branch on:
//!
//! - [`StorageError::InvalidArgument`]: caller-side misuse (non-positive
//!   dimensions, undersized fragment body, limit violations)
//! - [`StorageError::Storage`]: any underlying I/O failure, with the
//!   operation context and the OS error preserved as the source
//! - [`StorageError::FormatCorrupt`]: a bitmap header or file failed an
//!   internal consistency check (bad magic, wrong depth, truncated file)
//! - [`StorageError::NotFound`]: unknown canvas id; raised by the catalog,
//!   never by the file engine itself
//!
//! Two conditions are deliberately not errors: deleting an already-absent
//! canvas file, and a fragment rectangle whose intersection with the canvas
//! is empty. Both are successful no-ops by contract.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{context}")]
    Storage {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("corrupt bitmap: {0}")]
    FormatCorrupt(String),

    #[error("canvas {0} was not found")]
    NotFound(u64),
}

impl StorageError {
    pub(crate) fn storage(context: impl Into<String>, source: io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::FormatCorrupt(message.into())
    }
}
