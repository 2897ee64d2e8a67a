//! `tootur search` and `tootur context`.

use anyhow::{bail, Result};

use tootur_core::context::assemble;
use tootur_core::models::ScoredChunk;
use tootur_core::search::{retrieve_text, RetrievalParams};
use tootur_core::store::VectorStore;

use crate::config::Config;
use crate::embedding::create_provider;
use crate::sqlite_store::SqliteStore;

const SNIPPET_CHARS: usize = 200;

/// Retrieval parameters from config with command-line overrides applied.
pub fn effective_params(
    config: &Config,
    top_k: Option<usize>,
    threshold: Option<f32>,
) -> RetrievalParams {
    let mut params = config.retrieval.params();
    if let Some(k) = top_k {
        params.top_k = k;
    }
    if let Some(t) = threshold {
        params.threshold = t;
    }
    params
}

/// Embed `query` and rank the stored chunks against it.
async fn retrieve_for(
    config: &Config,
    query: &str,
    params: &RetrievalParams,
) -> Result<(Vec<ScoredChunk>, usize)> {
    if !config.embedding.is_enabled() {
        bail!("Search requires embeddings. Set [embedding] provider in config.");
    }
    let embedder = create_provider(&config.embedding)?;
    let store = SqliteStore::open(config).await?;

    let results = retrieve_text(&store, &*embedder, query, params).await?;
    let stored = store.count().await?;
    store.close().await;
    Ok((results, stored))
}

pub async fn run_search(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    threshold: Option<f32>,
    json: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let params = effective_params(config, top_k, threshold);
    let (results, stored) = retrieve_for(config, query, &params).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        if stored == 0 {
            println!("No results. The index is empty; run `tootur index` first.");
        } else {
            println!("No results.");
        }
        return Ok(());
    }

    for (rank, hit) in results.iter().enumerate() {
        println!(
            "{}. [{:.3}] {}#{}",
            rank + 1,
            hit.score,
            hit.chunk.source_id(),
            hit.chunk.chunk_index()
        );
        println!("   {}", snippet(hit.text()));
    }
    Ok(())
}

pub async fn run_context(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    threshold: Option<f32>,
) -> Result<()> {
    let params = effective_params(config, top_k, threshold);
    let (results, _) = retrieve_for(config, query, &params).await?;
    if results.is_empty() {
        println!("No relevant context.");
    } else {
        println!("{}", assemble(&results));
    }
    Ok(())
}

/// First line of `text`, cut to [`SNIPPET_CHARS`] characters.
fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut out: String = line.chars().take(SNIPPET_CHARS).collect();
    if line.chars().count() > SNIPPET_CHARS || text.lines().nth(1).is_some() {
        out.push_str("...");
    }
    out
}
