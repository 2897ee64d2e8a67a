//! Idempotent schema creation.
//!
//! | Table | Contents |
//! |-------|----------|
//! | `chunks` | One row per chunk: text, SHA-256 hash, little-endian f32 embedding BLOB |
//! | `store_meta` | Key/value pairs: `dims`, `model`, `indexed_at` |

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create every table and index if missing. Safe to call repeatedly.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // `seq` preserves insertion order, which is the store's enumeration order.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            source_id TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            hash TEXT NOT NULL,
            dims INTEGER NOT NULL,
            embedding BLOB NOT NULL,
            UNIQUE(source_id, chunk_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS store_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_hash ON chunks(hash)")
        .execute(pool)
        .await?;

    Ok(())
}
