//! Indexing pipeline: documents → chunks → embeddings → store.
//!
//! Failures are isolated. A document that cannot be chunked, or a chunk
//! whose embedding fails, is recorded in the [`IndexReport`] and skipped;
//! the rest of the batch is still indexed. Only storage backend errors
//! abort the run, plus a Replace run in which every document failed, which
//! leaves the stored set untouched.
//!
//! Two modes mirror the two store writes:
//! - [`IndexMode::Append`] inserts each document's chunks as they are ready.
//! - [`IndexMode::Replace`] collects everything and installs it with one
//!   `replace_all`, so readers switch from the old set to the new set in
//!   a single step.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::chunk::{chunk_text, ChunkingParams};
use crate::embedding::{embed_checked, Embedder};
use crate::error::{Result, RetrievalError};
use crate::models::{content_hash, Chunk, SourceDocument};
use crate::store::{validate_batch, VectorStore};

/// Previously computed embeddings keyed by [`content_hash`] of the text.
pub type EmbeddingCache = HashMap<String, Vec<f32>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    Append,
    Replace,
}

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub chunking: ChunkingParams,
    /// Texts per embedding call.
    pub batch_size: usize,
    pub mode: IndexMode,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            chunking: ChunkingParams::default(),
            batch_size: 64,
            mode: IndexMode::Replace,
        }
    }
}

/// A document or chunk that was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexFailure {
    pub source_id: String,
    /// `None` when the whole document failed.
    pub chunk_index: Option<usize>,
    pub error: RetrievalError,
}

#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub documents_seen: usize,
    pub documents_indexed: usize,
    pub chunks_written: usize,
    /// Chunks whose vector came from the cache instead of the embedder.
    pub chunks_reused: usize,
    pub failures: Vec<IndexFailure>,
}

impl IndexReport {
    fn fail(&mut self, source_id: &str, chunk_index: Option<usize>, error: RetrievalError) {
        warn!(source_id, ?chunk_index, error = %error, "skipped during indexing");
        self.failures.push(IndexFailure {
            source_id: source_id.to_string(),
            chunk_index,
            error,
        });
    }
}

/// Chunk, embed, and store `docs`.
///
/// # Errors
///
/// [`RetrievalError::InvalidInput`] up front for bad options. Errors from
/// the store's write itself are returned as-is; in
/// [`IndexMode::Replace`] that leaves the previous set in place. In
/// Replace mode, when documents were given but every one of them failed,
/// the first failure is returned and the store is not touched.
pub async fn index_documents<S, E>(
    store: &S,
    embedder: &E,
    docs: &[SourceDocument],
    options: &IndexOptions,
    cache: Option<&EmbeddingCache>,
) -> Result<IndexReport>
where
    S: VectorStore + ?Sized,
    E: Embedder + ?Sized,
{
    options.chunking.validate()?;
    if options.batch_size == 0 {
        return Err(RetrievalError::invalid("batch_size must be > 0"));
    }

    let mut report = IndexReport::default();
    let mut pending: Vec<Chunk> = Vec::new();
    // Dimension of the replacement set, fixed by its first accepted document.
    let mut pending_dims: Option<usize> = None;

    for doc in docs {
        report.documents_seen += 1;

        let texts = match chunk_text(&doc.text, &options.chunking) {
            Ok(texts) => texts,
            Err(e) => {
                report.fail(&doc.source_id, None, e);
                continue;
            }
        };

        let (chunks, reused) =
            embed_document(embedder, doc, texts, options.batch_size, cache, &mut report).await;
        if chunks.is_empty() {
            continue;
        }
        let written = chunks.len();

        match options.mode {
            IndexMode::Append => match store.insert_many(chunks).await {
                Ok(()) => {}
                Err(e @ RetrievalError::Backend(_)) => return Err(e),
                Err(e) => {
                    report.fail(&doc.source_id, None, e);
                    continue;
                }
            },
            IndexMode::Replace => match validate_batch(pending_dims, &chunks) {
                Ok(dims) => {
                    pending_dims = dims;
                    pending.extend(chunks);
                }
                Err(e) => {
                    report.fail(&doc.source_id, None, e);
                    continue;
                }
            },
        }

        debug!(source_id = %doc.source_id, chunks = written, "document indexed");
        report.documents_indexed += 1;
        report.chunks_written += written;
        report.chunks_reused += reused;
    }

    if options.mode == IndexMode::Replace {
        // Every document failed: keep the stored set rather than wipe it.
        if report.documents_indexed == 0 {
            if let Some(first) = report.failures.first() {
                warn!(
                    failures = report.failures.len(),
                    "no document indexed, keeping the existing chunks"
                );
                return Err(first.error.clone());
            }
        }
        store.replace_all(pending).await?;
    }

    info!(
        documents = report.documents_indexed,
        chunks = report.chunks_written,
        reused = report.chunks_reused,
        failures = report.failures.len(),
        "indexing finished"
    );
    Ok(report)
}

/// Embed one document's chunk texts, returning the chunks that succeeded
/// and how many vectors came from the cache.
async fn embed_document<E: Embedder + ?Sized>(
    embedder: &E,
    doc: &SourceDocument,
    texts: Vec<String>,
    batch_size: usize,
    cache: Option<&EmbeddingCache>,
    report: &mut IndexReport,
) -> (Vec<Chunk>, usize) {
    let mut vectors: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
    let mut reused = 0;
    let mut missing: Vec<usize> = Vec::new();

    for (i, text) in texts.iter().enumerate() {
        match cache.and_then(|c| c.get(&content_hash(text))) {
            Some(v) if v.len() == embedder.dims() => {
                vectors[i] = Some(v.clone());
                reused += 1;
            }
            _ => missing.push(i),
        }
    }

    for batch in missing.chunks(batch_size) {
        let batch_texts: Vec<String> = batch.iter().map(|&i| texts[i].clone()).collect();
        match embed_checked(embedder, &batch_texts).await {
            Ok(out) => {
                for (&i, v) in batch.iter().zip(out) {
                    vectors[i] = Some(v);
                }
            }
            Err(e) if batch.len() == 1 => report.fail(&doc.source_id, Some(batch[0]), e),
            Err(e) => {
                debug!(
                    source_id = %doc.source_id,
                    error = %e,
                    "batch failed, retrying chunks one by one"
                );
                for &i in batch {
                    match embed_checked(embedder, std::slice::from_ref(&texts[i])).await {
                        Ok(mut out) => vectors[i] = out.pop(),
                        Err(e) => report.fail(&doc.source_id, Some(i), e),
                    }
                }
            }
        }
    }

    let mut chunks = Vec::with_capacity(texts.len());
    for (i, (text, vector)) in texts.into_iter().zip(vectors).enumerate() {
        let Some(vector) = vector else { continue };
        match Chunk::new(doc.source_id.clone(), i, text, vector) {
            Ok(chunk) => chunks.push(chunk),
            Err(e) => report.fail(&doc.source_id, Some(i), e),
        }
    }
    (chunks, reused)
}
