//! `tootur index`: scan sources → chunk → embed → store.
//!
//! Reindex (default) installs the new chunk set with one `replace_all`;
//! `--append` adds each document's chunks to what is already stored.
//! Vectors for chunk text that is unchanged since the last run with the
//! same model are reused instead of re-embedded.

use anyhow::{bail, Context, Result};
use tracing::info;

use tootur_core::chunk::chunk_text;
use tootur_core::index::{index_documents, IndexMode, IndexOptions, IndexReport};
use tootur_core::models::SourceDocument;

use crate::config::Config;
use crate::embedding::create_provider;
use crate::sources::scan_sources;
use crate::sqlite_store::{SqliteStore, META_MODEL};

pub async fn run_index(config: &Config, append: bool, dry_run: bool) -> Result<()> {
    let sources = config
        .sources
        .as_ref()
        .context("No [sources] section in config; nothing to index")?;
    let docs = scan_sources(sources)?;
    let mode = if append {
        IndexMode::Append
    } else {
        IndexMode::Replace
    };

    if dry_run {
        println!("index {} (dry-run)", mode_label(mode));
        println!("  documents found: {}", docs.len());
        println!("  estimated chunks: {}", estimate_chunks(config, &docs));
        return Ok(());
    }

    if !config.embedding.is_enabled() {
        bail!("Indexing requires embeddings. Set [embedding] provider in config.");
    }

    let embedder = create_provider(&config.embedding)?;
    let store = SqliteStore::open(config).await?;

    let same_model = store.meta(META_MODEL).await?.as_deref() == Some(embedder.model_name());
    let cache = if same_model {
        Some(store.embedding_cache().await?)
    } else {
        None
    };

    let options = IndexOptions {
        chunking: config.chunking.params(),
        batch_size: config.embedding.batch_size,
        mode,
    };
    info!(documents = docs.len(), mode = mode_label(mode), "indexing");
    let report = index_documents(&store, &*embedder, &docs, &options, cache.as_ref()).await?;
    store.record_index(embedder.model_name()).await?;

    print_report(mode, docs.len(), &report);
    store.close().await;
    Ok(())
}

fn mode_label(mode: IndexMode) -> &'static str {
    match mode {
        IndexMode::Append => "append",
        IndexMode::Replace => "reindex",
    }
}

fn estimate_chunks(config: &Config, docs: &[SourceDocument]) -> usize {
    let params = config.chunking.params();
    docs.iter()
        .map(|doc| chunk_text(&doc.text, &params).map_or(0, |c| c.len()))
        .sum()
}

fn print_report(mode: IndexMode, found: usize, report: &IndexReport) {
    println!("index {}", mode_label(mode));
    println!("  documents found: {}", found);
    println!("  documents indexed: {}", report.documents_indexed);
    println!("  chunks written: {}", report.chunks_written);
    println!("  embeddings reused: {}", report.chunks_reused);
    println!("  failures: {}", report.failures.len());
    for failure in &report.failures {
        match failure.chunk_index {
            Some(index) => println!("    {}#{}: {}", failure.source_id, index, failure.error),
            None => println!("    {}: {}", failure.source_id, failure.error),
        }
    }
    println!("ok");
}
