//! Core data models for the retrieval pipeline.
//!
//! A [`Chunk`] is created once during indexing and never mutated; the
//! store owns chunks behind `Arc` so searches can borrow them without
//! copying text or vectors.

use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Result, RetrievalError};

/// A bounded slice of a source document paired with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    source_id: String,
    chunk_index: usize,
    text: String,
    #[serde(skip)]
    embedding: Vec<f32>,
    hash: String,
}

impl Chunk {
    /// Build a chunk, rejecting empty text and empty or non-finite vectors.
    pub fn new(
        source_id: impl Into<String>,
        chunk_index: usize,
        text: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(RetrievalError::invalid("chunk text must not be empty"));
        }
        if embedding.is_empty() {
            return Err(RetrievalError::invalid("chunk embedding must not be empty"));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(RetrievalError::invalid(
                "chunk embedding contains a non-finite value",
            ));
        }
        let hash = content_hash(&text);
        Ok(Self {
            source_id: source_id.into(),
            chunk_index,
            text,
            embedding,
            hash,
        })
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn dims(&self) -> usize {
        self.embedding.len()
    }

    /// SHA-256 hex digest of the chunk text.
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

/// SHA-256 hex digest used to detect unchanged chunk text across reindexes.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A chunk ranked by the retrieval engine. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Arc<Chunk>,
    pub score: f32,
}

impl ScoredChunk {
    pub fn text(&self) -> &str {
        self.chunk.text()
    }
}

/// Raw query text plus its embedding.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A document handed to the indexer.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub source_id: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
        }
    }
}
