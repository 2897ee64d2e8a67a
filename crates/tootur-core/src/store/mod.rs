//! Vector store abstraction.
//!
//! The [`VectorStore`] trait holds `(source_id, chunk_index, text,
//! embedding)` records and is all the retrieval engine needs. Backends
//! (in-memory here, SQLite in the app crate) are passed explicitly to
//! [`retrieve`](crate::search::retrieve); there is no process-wide
//! connection state.
//!
//! # Consistency
//!
//! [`all`](VectorStore::all) returns a [`ChunkSnapshot`]: an immutable view
//! of one generation of the store. A concurrent
//! [`replace_all`](VectorStore::replace_all) never changes a snapshot that
//! has already been handed out, so a scan sees either the full old set or
//! the full new set.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Result, RetrievalError};
use crate::models::Chunk;

pub use memory::InMemoryStore;

/// Abstract storage backend for embedded chunks.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`dims`](VectorStore::dims) | Established embedding dimension, if any |
/// | [`insert_many`](VectorStore::insert_many) | Append a batch (all-or-nothing) |
/// | [`replace_all`](VectorStore::replace_all) | Atomically swap in a new set |
/// | [`all`](VectorStore::all) | Consistent snapshot for a scan |
/// | [`count`](VectorStore::count) | Number of stored chunks |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The dimension D every stored vector shares, or `None` before the
    /// first insert when no dimension was configured.
    async fn dims(&self) -> Result<Option<usize>>;

    /// Append chunks. A chunk whose `(source_id, chunk_index)` is already
    /// stored replaces that chunk in place instead of adding a second copy.
    ///
    /// Fails with [`RetrievalError::DimensionMismatch`] if any vector's
    /// length differs from D; nothing from the batch is stored then.
    async fn insert_many(&self, chunks: Vec<Chunk>) -> Result<()>;

    /// Drop every stored chunk and install `chunks` in one step.
    ///
    /// On failure the previous set stays intact.
    async fn replace_all(&self, chunks: Vec<Chunk>) -> Result<()>;

    /// A consistent snapshot of every stored chunk.
    async fn all(&self) -> Result<ChunkSnapshot>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize>;
}

/// Hard limits applied by a store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreLimits {
    /// Pin the embedding dimension ahead of indexing.
    pub dims: Option<usize>,
    /// Refuse inserts that would grow the store past this many chunks.
    pub max_chunks: Option<usize>,
}

/// Immutable view of one generation of a store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChunkSnapshot {
    chunks: Arc<[Arc<Chunk>]>,
    dims: Option<usize>,
}

impl ChunkSnapshot {
    pub fn new(chunks: Vec<Arc<Chunk>>, dims: Option<usize>) -> Self {
        Self {
            chunks: chunks.into(),
            dims,
        }
    }

    /// Lazily enumerate the snapshot in store order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Chunk>> + '_ {
        self.chunks.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Chunk>> {
        self.chunks.get(index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dims(&self) -> Option<usize> {
        self.dims
    }
}

impl Default for ChunkSnapshot {
    fn default() -> Self {
        Self::new(Vec::new(), None)
    }
}

/// Check that every chunk in `chunks` has the same dimension, and that it
/// matches `established` when one is set.
///
/// Returns the dimension the store has after accepting the batch.
pub fn validate_batch(established: Option<usize>, chunks: &[Chunk]) -> Result<Option<usize>> {
    let mut dims = established;
    for chunk in chunks {
        match dims {
            Some(expected) if chunk.dims() != expected => {
                return Err(RetrievalError::DimensionMismatch {
                    expected,
                    found: chunk.dims(),
                });
            }
            Some(_) => {}
            None => dims = Some(chunk.dims()),
        }
    }
    Ok(dims)
}

/// Fail with [`RetrievalError::CapacityExceeded`] if `requested` is over `limit`.
pub fn check_capacity(limit: Option<usize>, requested: usize) -> Result<()> {
    match limit {
        Some(capacity) if requested > capacity => Err(RetrievalError::CapacityExceeded {
            capacity,
            requested,
        }),
        _ => Ok(()),
    }
}
