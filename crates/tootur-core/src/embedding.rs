//! Embedding capability trait and vector utilities.
//!
//! Defines the [`Embedder`] trait that every embedding backend implements,
//! plus pure helpers for similarity and BLOB encoding.
//!
//! Concrete providers (OpenAI, Ollama) live in the `tootur` app crate.
//! The core only relies on three properties of a provider: identical
//! input yields an identical vector within the process, the output
//! dimension is fixed and known up front, and a call may fail.

use async_trait::async_trait;

use crate::error::{Result, RetrievalError};
use crate::models::Query;

/// A text → vector capability with a fixed output dimension.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts, returning one vector per input in order.
    ///
    /// Failures are reported as [`RetrievalError::EmbeddingUnavailable`].
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed `texts` and check the response shape against the provider's
/// declared dimension.
///
/// A provider that returns the wrong number of vectors or a vector of the
/// wrong length is treated as unavailable rather than coerced.
pub async fn embed_checked<E: Embedder + ?Sized>(
    embedder: &E,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let vectors = embedder.embed(texts).await?;
    if vectors.len() != texts.len() {
        return Err(RetrievalError::EmbeddingUnavailable(format!(
            "{} returned {} vectors for {} texts",
            embedder.model_name(),
            vectors.len(),
            texts.len()
        )));
    }
    let dims = embedder.dims();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
        return Err(RetrievalError::DimensionMismatch {
            expected: dims,
            found: bad.len(),
        });
    }
    Ok(vectors)
}

/// Embed a single query text into a [`Query`].
pub async fn embed_query<E: Embedder + ?Sized>(embedder: &E, text: &str) -> Result<Query> {
    if text.trim().is_empty() {
        return Err(RetrievalError::invalid("query text must not be empty"));
    }
    let embedding = embed_checked(embedder, &[text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RetrievalError::EmbeddingUnavailable("empty embedding response".into()))?;
    Ok(Query {
        text: text.to_string(),
        embedding,
    })
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// ```rust
/// use tootur_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB produced by [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` when either vector has zero norm, and for empty vectors
/// or vectors of different lengths.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    // f64 accumulators: f32 squares overflow for large components and
    // underflow for tiny ones.
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder {
        dims: usize,
        out: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn model_name(&self) -> &str {
            "fixed"
        }
        fn dims(&self) -> usize {
            self.dims
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(self.out.clone())
        }
    }

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        assert_eq!(blob_to_vec(&vec_to_blob(&vec)), vec);
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_tiny_and_huge_vectors_match_themselves() {
        let tiny = [1e-4f32, 0.0];
        assert_eq!(cosine_similarity(&tiny, &tiny), 1.0);
        let subnormal = [1e-40f32, 2e-40];
        assert_eq!(cosine_similarity(&subnormal, &subnormal), 1.0);
        let huge = [1e20f32, 0.0];
        assert_eq!(cosine_similarity(&huge, &huge), 1.0);
        let max = [f32::MAX, -f32::MAX];
        assert_eq!(cosine_similarity(&max, &max), 1.0);
    }

    #[test]
    fn test_cosine_scale_invariant() {
        let sim = cosine_similarity(&[1.0, 2.0], &[10.0, 20.0]);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_different_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[tokio::test]
    async fn test_embed_checked_rejects_wrong_count() {
        let e = FixedEmbedder {
            dims: 2,
            out: vec![vec![1.0, 0.0]],
        };
        let err = embed_checked(&e, &["a".into(), "b".into()]).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn test_embed_checked_rejects_wrong_dims() {
        let e = FixedEmbedder {
            dims: 3,
            out: vec![vec![1.0, 0.0]],
        };
        let err = embed_checked(&e, &["a".into()]).await.unwrap_err();
        assert_eq!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 3,
                found: 2
            }
        );
    }

    #[tokio::test]
    async fn test_embed_query() {
        let e = FixedEmbedder {
            dims: 2,
            out: vec![vec![0.5, 0.5]],
        };
        let q = embed_query(&e, "tell me about cats").await.unwrap();
        assert_eq!(q.text, "tell me about cats");
        assert_eq!(q.embedding, vec![0.5, 0.5]);
        assert!(embed_query(&e, "  ").await.is_err());
    }
}
