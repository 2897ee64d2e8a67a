//! Retrieval engine: exact cosine top-k over a [`VectorStore`].
//!
//! The engine operates entirely through the store trait. The caller
//! embeds the query, builds [`RetrievalParams`], and passes the store by
//! reference.
//!
//! # Ranking Algorithm
//!
//! 1. Take one [`ChunkSnapshot`] from the store.
//! 2. Score every chunk: `cos(query, embedding)`, `0.0` for zero-norm vectors.
//! 3. Select the `top_k` highest scores. Ties keep store enumeration order,
//!    so results are deterministic for a fixed snapshot.
//! 4. Sort the selection by score (desc), enumeration index (asc).
//! 5. Drop anything below `threshold`.
//!
//! The scan is a brute-force linear pass costing `count × D`. An ANN
//! index would be another implementation of this same contract.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::embedding::{cosine_similarity, embed_query, Embedder};
use crate::error::{Result, RetrievalError};
use crate::models::ScoredChunk;
use crate::store::{ChunkSnapshot, VectorStore};

/// Retrieval tuning parameters, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RetrievalParams {
    /// Maximum results to return. Must be > 0.
    pub top_k: usize,
    /// Minimum cosine score a result must reach.
    pub threshold: f32,
    /// Refuse to scan snapshots larger than this.
    #[serde(default)]
    pub max_scan: Option<usize>,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            threshold: 0.3,
            max_scan: None,
        }
    }
}

impl RetrievalParams {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RetrievalError::invalid("top_k must be > 0"));
        }
        if !self.threshold.is_finite() {
            return Err(RetrievalError::invalid("threshold must be a finite number"));
        }
        Ok(())
    }
}

/// Score every stored chunk against `query_embedding` and return the
/// best `top_k` at or above `threshold`, highest score first.
///
/// An empty store yields `Ok(vec![])`; use
/// [`VectorStore::count`] to tell that apart from "nothing matched".
///
/// # Errors
///
/// - [`RetrievalError::InvalidInput`] for bad parameters or an empty /
///   non-finite query vector.
/// - [`RetrievalError::DimensionMismatch`] if the query length differs
///   from the store's D.
/// - [`RetrievalError::ScanLimitExceeded`] if the snapshot is larger than
///   `max_scan`.
/// - Store errors are passed through unchanged; nothing is retried.
pub async fn retrieve<S: VectorStore + ?Sized>(
    store: &S,
    query_embedding: &[f32],
    params: &RetrievalParams,
) -> Result<Vec<ScoredChunk>> {
    params.validate()?;
    validate_query(query_embedding)?;
    let snapshot = store.all().await?;
    rank(&snapshot, query_embedding, params)
}

/// Embed `text` with `embedder`, then [`retrieve`].
pub async fn retrieve_text<S, E>(
    store: &S,
    embedder: &E,
    text: &str,
    params: &RetrievalParams,
) -> Result<Vec<ScoredChunk>>
where
    S: VectorStore + ?Sized,
    E: Embedder + ?Sized,
{
    params.validate()?;
    let query = embed_query(embedder, text).await?;
    retrieve(store, &query.embedding, params).await
}

/// Rank one snapshot. Pure in-memory computation.
pub fn rank(
    snapshot: &ChunkSnapshot,
    query_embedding: &[f32],
    params: &RetrievalParams,
) -> Result<Vec<ScoredChunk>> {
    params.validate()?;
    if snapshot.is_empty() {
        debug!("retrieval against empty store");
        return Ok(Vec::new());
    }
    if let Some(limit) = params.max_scan {
        if snapshot.len() > limit {
            return Err(RetrievalError::ScanLimitExceeded {
                count: snapshot.len(),
                limit,
            });
        }
    }
    if let Some(expected) = snapshot.dims() {
        if expected != query_embedding.len() {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                found: query_embedding.len(),
            });
        }
    }

    let mut scored: Vec<(usize, f32)> = snapshot
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let score = cosine_similarity(query_embedding, chunk.embedding());
            (i, if score.is_finite() { score } else { 0.0 })
        })
        .collect();

    let k = params.top_k.min(scored.len());
    if k < scored.len() {
        scored.select_nth_unstable_by(k - 1, by_rank);
        scored.truncate(k);
    }
    scored.sort_by(by_rank);

    let results: Vec<ScoredChunk> = scored
        .into_iter()
        .filter(|(_, score)| *score >= params.threshold)
        .filter_map(|(i, score)| {
            snapshot.get(i).map(|chunk| ScoredChunk {
                chunk: Arc::clone(chunk),
                score,
            })
        })
        .collect();

    debug!(
        scanned = snapshot.len(),
        returned = results.len(),
        top_k = params.top_k,
        threshold = params.threshold,
        "retrieval complete"
    );

    Ok(results)
}

/// Score descending, then enumeration index ascending.
fn by_rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

fn validate_query(query_embedding: &[f32]) -> Result<()> {
    if query_embedding.is_empty() {
        return Err(RetrievalError::invalid("query embedding must not be empty"));
    }
    if query_embedding.iter().any(|v| !v.is_finite()) {
        return Err(RetrievalError::invalid(
            "query embedding contains a non-finite value",
        ));
    }
    Ok(())
}
