//! Boundary-aware overlapping text chunker.
//!
//! Splits document text into windows of at most `max_length` characters
//! that overlap by `overlap` characters. Lengths are counted in Unicode
//! scalar values, so a window never ends inside a multi-byte sequence.
//!
//! # Algorithm
//!
//! 1. Text of at most `max_length` characters is returned whole (trimmed).
//! 2. Otherwise scan left to right. The provisional window end is
//!    `min(start + max_length, len)`.
//! 3. If the window ends before the text does, back off to the last
//!    paragraph break (`"\n\n"`) past the window midpoint; failing that,
//!    to the last sentence terminator (`". "`, `"! "`, `"? "`) past the
//!    midpoint; failing that, keep the hard cut.
//! 4. The next window starts `overlap` characters before the chunk end,
//!    or at the chunk end when that would not move forward.
//! 5. Chunks are trimmed; empty chunks are dropped.
//!
//! # Example
//!
//! ```rust
//! use tootur_core::chunk::{chunk_text, ChunkingParams};
//!
//! let params = ChunkingParams { max_length: 12, overlap: 0 };
//! let chunks = chunk_text("Hi there. You are bold", &params).unwrap();
//! assert_eq!(chunks, vec!["Hi there.", "You are bold"]);
//! ```

use serde::Deserialize;

use crate::error::{Result, RetrievalError};

const PARAGRAPH_BREAK: &str = "\n\n";
const SENTENCE_BREAKS: [&str; 3] = [". ", "! ", "? "];

/// Window size and overlap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChunkingParams {
    pub max_length: usize,
    pub overlap: usize,
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            max_length: 2000,
            overlap: 200,
        }
    }
}

impl ChunkingParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(RetrievalError::invalid("max_length must be > 0"));
        }
        if self.overlap >= self.max_length {
            return Err(RetrievalError::InvalidInput(format!(
                "overlap ({}) must be smaller than max_length ({})",
                self.overlap, self.max_length
            )));
        }
        Ok(())
    }
}

/// Split `text` into ordered, non-empty, overlapping chunks.
///
/// Identical `(text, params)` always yields the identical sequence.
///
/// # Errors
///
/// [`RetrievalError::InvalidInput`] for empty or whitespace-only text and
/// for invalid parameters. Nothing is processed in that case.
pub fn chunk_text(text: &str, params: &ChunkingParams) -> Result<Vec<String>> {
    params.validate()?;
    if text.trim().is_empty() {
        return Err(RetrievalError::invalid("text must not be empty"));
    }

    // Byte offset of every char, plus a sentinel for the end of the text.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = offsets.len() - 1;

    if len <= params.max_length {
        return Ok(vec![text.trim().to_string()]);
    }

    let mut chunks = Vec::new();
    let mut current = 0;

    while current < len {
        let mut end = (current + params.max_length).min(len);
        if end < len {
            if let Some(boundary) = find_boundary(text, &offsets, current, end, params.max_length)
            {
                end = boundary;
            }
        }

        let piece = text[offsets[current]..offsets[end]].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= len {
            break;
        }
        current = next_start(current, end, params.overlap);
    }

    Ok(chunks)
}

/// Char index just past the preferred break inside `[start, end)`, if one
/// lies strictly after the window midpoint.
fn find_boundary(
    text: &str,
    offsets: &[usize],
    start: usize,
    end: usize,
    max_length: usize,
) -> Option<usize> {
    let base = offsets[start];
    let window = &text[base..offsets[end]];
    let midpoint = start + max_length / 2;
    let to_char = |pos: usize| offsets.partition_point(|&o| o < base + pos);

    if let Some(pos) = window.rfind(PARAGRAPH_BREAK) {
        let at = to_char(pos);
        if at > midpoint {
            return Some(at + PARAGRAPH_BREAK.len());
        }
    }

    let sentence = SENTENCE_BREAKS
        .iter()
        .filter_map(|pat| window.rfind(pat))
        .max();
    if let Some(pos) = sentence {
        let at = to_char(pos);
        if at > midpoint {
            return Some(at + 2);
        }
    }

    None
}

/// Start of the window after a chunk ending at `end`.
///
/// Carries `overlap` characters back from the actual chunk end so a
/// boundary back-off never leaves a gap, and falls back to `end` when the
/// overlap would not move past `current`.
fn next_start(current: usize, end: usize, overlap: usize) -> usize {
    let carried = end.saturating_sub(overlap);
    if carried > current {
        carried
    } else {
        end
    }
}
