//! In-memory [`VectorStore`] with copy-on-write generations.
//!
//! The current generation is an `Arc`'d [`ChunkSnapshot`] behind a
//! `std::sync::RwLock`. Readers clone the `Arc` and scan without holding
//! the lock. Writers are serialised by a `Mutex`, build the next
//! generation off to the side, and take the write lock only to swap the
//! pointer. A chunk is published fully formed or not at all.
//!
//! A chunk whose `(source_id, chunk_index)` is already stored replaces the
//! stored one in place, so re-appending a document does not duplicate it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Chunk;

use super::{check_capacity, validate_batch, ChunkSnapshot, StoreLimits, VectorStore};

/// In-memory store for tests, single-process deployments, and as the
/// reference implementation of the store contract.
pub struct InMemoryStore {
    limits: StoreLimits,
    current: RwLock<ChunkSnapshot>,
    writer: Mutex<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_limits(StoreLimits::default())
    }

    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            limits,
            current: RwLock::new(ChunkSnapshot::new(Vec::new(), limits.dims)),
            writer: Mutex::new(()),
        }
    }

    fn snapshot(&self) -> ChunkSnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, next: ChunkSnapshot) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn append(&self, chunks: Vec<Chunk>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();
        let dims = validate_batch(current.dims(), &chunks)?;

        let mut next: Vec<Arc<Chunk>> = Vec::with_capacity(current.len() + chunks.len());
        next.extend(current.iter().cloned());
        let mut slots: HashMap<(String, usize), usize> = next
            .iter()
            .enumerate()
            .map(|(i, c)| ((c.source_id().to_string(), c.chunk_index()), i))
            .collect();
        for chunk in chunks {
            let key = (chunk.source_id().to_string(), chunk.chunk_index());
            match slots.get(&key) {
                Some(&i) => next[i] = Arc::new(chunk),
                None => {
                    slots.insert(key, next.len());
                    next.push(Arc::new(chunk));
                }
            }
        }
        check_capacity(self.limits.max_chunks, next.len())?;

        self.publish(ChunkSnapshot::new(next, dims));
        Ok(())
    }

    fn replace(&self, chunks: Vec<Chunk>) -> Result<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let dims = validate_batch(self.limits.dims, &chunks)?;
        check_capacity(self.limits.max_chunks, chunks.len())?;

        let next = chunks.into_iter().map(Arc::new).collect();
        self.publish(ChunkSnapshot::new(next, dims));
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn dims(&self) -> Result<Option<usize>> {
        Ok(self.snapshot().dims())
    }

    async fn insert_many(&self, chunks: Vec<Chunk>) -> Result<()> {
        self.append(chunks)
    }

    async fn replace_all(&self, chunks: Vec<Chunk>) -> Result<()> {
        self.replace(chunks)
    }

    async fn all(&self) -> Result<ChunkSnapshot> {
        Ok(self.snapshot())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.snapshot().len())
    }
}
