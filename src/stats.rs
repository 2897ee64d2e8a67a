//! `tootur stats`: what is indexed and with which model.

use anyhow::Result;
use tootur_core::store::VectorStore;

use crate::config::Config;
use crate::sqlite_store::{SqliteStore, META_INDEXED_AT, META_MODEL};

pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;

    let chunks = store.count().await?;
    let sources = store.source_count().await?;
    let dims = store.dims().await?;
    let model = store.meta(META_MODEL).await?;
    let indexed_at = store.meta(META_INDEXED_AT).await?;
    store.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Tootur Index Stats");
    println!("==================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Sources:     {}", sources);
    println!("  Chunks:      {}", chunks);
    println!(
        "  Dimensions:  {}",
        dims.map_or_else(|| "-".to_string(), |d| d.to_string())
    );
    println!("  Model:       {}", model.as_deref().unwrap_or("-"));
    println!(
        "  Indexed:     {}",
        indexed_at
            .as_deref()
            .map_or_else(|| "never".to_string(), format_relative)
    );
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// An RFC 3339 timestamp as "3 hours ago"; unparseable values are shown as-is.
fn format_relative(rfc3339: &str) -> String {
    let Ok(ts) = chrono::DateTime::parse_from_rfc3339(rfc3339) else {
        return rfc3339.to_string();
    };
    let delta = (chrono::Utc::now() - ts.with_timezone(&chrono::Utc)).num_seconds();
    let plural = |n: i64| if n == 1 { "" } else { "s" };

    if delta < 0 {
        ts.format("%Y-%m-%d %H:%M").to_string()
    } else if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        format!("{} min{} ago", delta / 60, plural(delta / 60))
    } else if delta < 86400 {
        format!("{} hour{} ago", delta / 3600, plural(delta / 3600))
    } else if delta < 86400 * 30 {
        format!("{} day{} ago", delta / 86400, plural(delta / 86400))
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}
