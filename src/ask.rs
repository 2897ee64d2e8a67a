//! `tootur ask`: answer a question from the indexed documents.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::embedding::create_provider;
use crate::generation::{answer, create_generator};
use crate::search::effective_params;
use crate::sqlite_store::SqliteStore;

pub async fn run_ask(
    config: &Config,
    question: &str,
    top_k: Option<usize>,
    threshold: Option<f32>,
) -> Result<()> {
    if question.trim().is_empty() {
        bail!("Question must not be empty");
    }
    if !config.embedding.is_enabled() {
        bail!("Asking requires embeddings. Set [embedding] provider in config.");
    }
    if !config.generation.is_enabled() {
        bail!("Asking requires a chat model. Set [generation] provider in config.");
    }

    let embedder = create_provider(&config.embedding)?;
    let generator = create_generator(&config.generation)?;
    let store = SqliteStore::open(config).await?;
    let params = effective_params(config, top_k, threshold);

    let result = answer(&store, &*embedder, &*generator, question, &params).await?;
    store.close().await;

    println!("{}", result.text);
    if !result.sources.is_empty() {
        println!();
        println!("Sources:");
        for hit in &result.sources {
            println!(
                "  [{:.3}] {}#{}",
                hit.score,
                hit.chunk.source_id(),
                hit.chunk.chunk_index()
            );
        }
    }
    Ok(())
}
