//! # Tootur
//!
//! Ask questions of your own documents. Tootur indexes a directory of
//! PDFs, text and markdown into a local SQLite store of embedded chunks,
//! retrieves the chunks closest to a question by cosine similarity, and
//! hands them to a chat model as context.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │   Sources   │──▶│  Pipeline   │──▶│  SQLite  │
//! │ PDF/TXT/MD  │   │ Chunk+Embed │   │ chunks   │
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │
//!                                    ┌─────▼─────┐   ┌──────────┐
//!                                    │  Top-k    │──▶│   Chat   │
//!                                    │  cosine   │   │  model   │
//!                                    └───────────┘   └──────────┘
//! ```
//!
//! The retrieval logic itself (chunker, store contract, ranking, context
//! assembly, indexing pipeline) lives in the `tootur-core` crate; this
//! crate supplies configuration, SQLite storage, HTTP providers and the CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! tootur init                       # create database
//! tootur index                      # scan, chunk, embed, store
//! tootur search "deployment"        # ranked chunks
//! tootur ask "How do I deploy?"     # answer with sources
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite vector store |
//! | [`embedding`] | Embedding providers |
//! | [`generation`] | Chat generation and the answer flow |
//! | [`extract`] | PDF / text extraction |
//! | [`sources`] | Directory scanning |
//! | [`ingest`], [`search`], [`ask`], [`stats`] | CLI commands |

pub mod ask;
pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod generation;
pub mod ingest;
pub mod migrate;
pub mod retry;
pub mod search;
pub mod sources;
pub mod sqlite_store;
pub mod stats;
