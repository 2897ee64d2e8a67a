//! Error taxonomy for the retrieval core.
//!
//! An empty store is not represented here: [`retrieve`](crate::search::retrieve)
//! returns an empty result set and callers check
//! [`count`](crate::store::VectorStore::count) to tell "nothing indexed yet"
//! apart from "nothing matched".

use thiserror::Error;

/// Errors produced by chunking, storage, embedding, and retrieval.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RetrievalError {
    /// Rejected before any work was done (empty text, bad parameters).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A vector's length disagrees with the store's established dimension.
    #[error("expected embedding dimension {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The embedding capability failed for a text.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The store's hard cap on chunk count would be exceeded.
    #[error("capacity exceeded: {capacity} < {requested}")]
    CapacityExceeded { capacity: usize, requested: usize },

    /// A retrieval would scan more chunks than the configured limit.
    #[error("scan limit exceeded: {count} chunks stored, limit is {limit}")]
    ScanLimitExceeded { count: usize, limit: usize },

    /// The storage backend failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl RetrievalError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
