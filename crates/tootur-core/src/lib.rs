//! # Tootur Core
//!
//! The retrieval half of Tootur: overlapping text chunking, the vector
//! store abstraction, exact cosine top-k search, and context assembly.
//!
//! This crate contains no tokio, sqlx, filesystem, or network code.
//! Embedding models and storage backends are plugged in through the
//! [`embedding::Embedder`] and [`store::VectorStore`] traits.
//!
//! ```text
//! documents ─▶ chunk ─▶ Embedder ─▶ VectorStore
//! query ─▶ Embedder ─▶ search::retrieve ─▶ context::assemble ─▶ prompt
//! ```

pub mod chunk;
pub mod context;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod search;
pub mod store;

pub use error::{Result, RetrievalError};
