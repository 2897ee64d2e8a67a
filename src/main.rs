//! # Tootur CLI (`tootur`)
//!
//! ```bash
//! tootur --config ./config/tootur.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tootur init` | Create the SQLite database and schema |
//! | `tootur index` | Scan sources, chunk, embed and store (reindex) |
//! | `tootur index --append` | Add chunks without dropping existing ones |
//! | `tootur search "<query>"` | Ranked chunks for a query |
//! | `tootur context "<query>"` | The assembled context block only |
//! | `tootur ask "<question>"` | Answer a question with sources |
//! | `tootur stats` | What is indexed |
//!
//! Logs go to stderr; set `RUST_LOG` (e.g. `RUST_LOG=tootur=debug`) to
//! change the level.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tootur::{ask, config, ingest, migrate, search, stats};

/// Tootur: ask questions of your own documents.
#[derive(Parser)]
#[command(name = "tootur", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tootur.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Scan the sources directory and (re)build the index.
    Index {
        /// Add to the existing index instead of replacing it.
        #[arg(long)]
        append: bool,

        /// Show document and chunk counts without embedding or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Rank indexed chunks against a query.
    Search {
        query: String,

        /// Maximum number of results.
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum cosine score.
        #[arg(long)]
        threshold: Option<f32>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the context block that `ask` would send to the model.
    Context {
        query: String,

        #[arg(long)]
        top_k: Option<usize>,

        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Answer a question from the indexed documents.
    Ask {
        question: String,

        #[arg(long)]
        top_k: Option<usize>,

        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Show index statistics.
    Stats,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index { append, dry_run } => {
            ingest::run_index(&cfg, append, dry_run).await?;
        }
        Commands::Search {
            query,
            top_k,
            threshold,
            json,
        } => {
            search::run_search(&cfg, &query, top_k, threshold, json).await?;
        }
        Commands::Context {
            query,
            top_k,
            threshold,
        } => {
            search::run_context(&cfg, &query, top_k, threshold).await?;
        }
        Commands::Ask {
            question,
            top_k,
            threshold,
        } => {
            ask::run_ask(&cfg, &question, top_k, threshold).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
