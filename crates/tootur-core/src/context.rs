//! Context assembly for prompt construction.

use crate::models::ScoredChunk;

/// Render ranked chunks as numbered blocks, in input order, separated by
/// a blank line.
///
/// An empty slice yields an empty string; substituting a fallback message
/// is the caller's job.
///
/// ```rust
/// use tootur_core::context::assemble;
///
/// assert_eq!(assemble(&[]), "");
/// ```
pub fn assemble(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, sc)| format!("Chunk {}: {}", i + 1, sc.text()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
