//! SQLite-backed [`VectorStore`].
//!
//! Chunks live in the `chunks` table (see [`migrate`](crate::migrate)) with
//! their embeddings as little-endian f32 BLOBs. Each write runs in one
//! transaction, so a concurrent reader sees the old set or the new set and
//! never a mixture. Appending a chunk whose `(source_id, chunk_index)` is
//! already stored updates that row and keeps its position. Writers inside
//! this process are additionally serialised by a mutex so the dimension and
//! capacity checks see the rows they guard.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use tootur_core::embedding::{blob_to_vec, vec_to_blob};
use tootur_core::index::EmbeddingCache;
use tootur_core::models::Chunk;
use tootur_core::store::{check_capacity, validate_batch, ChunkSnapshot, StoreLimits, VectorStore};
use tootur_core::RetrievalError;

use crate::config::Config;
use crate::db;
use crate::migrate;

type CoreResult<T> = tootur_core::Result<T>;

pub const META_MODEL: &str = "model";
pub const META_DIMS: &str = "dims";
pub const META_INDEXED_AT: &str = "indexed_at";

pub struct SqliteStore {
    pool: SqlitePool,
    limits: StoreLimits,
    writer: Mutex<()>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, limits: StoreLimits) -> Self {
        Self {
            pool,
            limits,
            writer: Mutex::new(()),
        }
    }

    /// Connect to the configured database and make sure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::create_schema(&pool).await?;
        Ok(Self::new(pool, config.store_limits()))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Stored vectors keyed by chunk hash, for reuse during reindexing.
    pub async fn embedding_cache(&self) -> Result<EmbeddingCache> {
        let rows = sqlx::query("SELECT hash, embedding FROM chunks")
            .fetch_all(&self.pool)
            .await?;

        let mut cache = EmbeddingCache::with_capacity(rows.len());
        for row in rows {
            let hash: String = row.get("hash");
            let blob: Vec<u8> = row.get("embedding");
            cache.insert(hash, blob_to_vec(&blob));
        }
        Ok(cache)
    }

    pub async fn meta(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar("SELECT value FROM store_meta WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    pub async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO store_meta (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record which model produced the stored vectors and when.
    pub async fn record_index(&self, model: &str) -> Result<()> {
        if let Some(dims) = self.dims().await? {
            self.set_meta(META_DIMS, &dims.to_string()).await?;
        }
        self.set_meta(META_MODEL, model).await?;
        self.set_meta(META_INDEXED_AT, &chrono::Utc::now().to_rfc3339())
            .await?;
        Ok(())
    }

    pub async fn source_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(DISTINCT source_id) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn stored_dims(&self, tx: &mut Transaction<'_, Sqlite>) -> CoreResult<Option<usize>> {
        if self.limits.dims.is_some() {
            return Ok(self.limits.dims);
        }
        let dims: Option<i64> = sqlx::query_scalar("SELECT dims FROM chunks ORDER BY seq LIMIT 1")
            .fetch_optional(&mut **tx)
            .await
            .map_err(RetrievalError::backend)?;
        Ok(dims.map(|d| d as usize))
    }

    async fn stored_count(tx: &mut Transaction<'_, Sqlite>) -> CoreResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&mut **tx)
            .await
            .map_err(RetrievalError::backend)?;
        Ok(count as usize)
    }

    async fn write_rows(tx: &mut Transaction<'_, Sqlite>, chunks: &[Chunk]) -> CoreResult<()> {
        for chunk in chunks {
            sqlx::query(
                "INSERT INTO chunks (source_id, chunk_index, text, hash, dims, embedding)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT(source_id, chunk_index) DO UPDATE SET
                     text = excluded.text,
                     hash = excluded.hash,
                     dims = excluded.dims,
                     embedding = excluded.embedding",
            )
            .bind(chunk.source_id())
            .bind(chunk.chunk_index() as i64)
            .bind(chunk.text())
            .bind(chunk.hash())
            .bind(chunk.dims() as i64)
            .bind(vec_to_blob(chunk.embedding()))
            .execute(&mut **tx)
            .await
            .map_err(RetrievalError::backend)?;
        }
        Ok(())
    }

    async fn begin(&self) -> CoreResult<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(RetrievalError::backend)
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn dims(&self) -> CoreResult<Option<usize>> {
        let mut tx = self.begin().await?;
        let dims = self.stored_dims(&mut tx).await?;
        tx.rollback().await.map_err(RetrievalError::backend)?;
        Ok(dims)
    }

    async fn insert_many(&self, chunks: Vec<Chunk>) -> CoreResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let _writer = self.writer.lock().await;
        let mut tx = self.begin().await?;

        let established = self.stored_dims(&mut tx).await?;
        validate_batch(established, &chunks)?;

        // Rows with a stored key are updated in place, so capacity is
        // checked on the written result; dropping `tx` rolls it back.
        Self::write_rows(&mut tx, &chunks).await?;
        check_capacity(self.limits.max_chunks, Self::stored_count(&mut tx).await?)?;
        tx.commit().await.map_err(RetrievalError::backend)?;
        Ok(())
    }

    async fn replace_all(&self, chunks: Vec<Chunk>) -> CoreResult<()> {
        validate_batch(self.limits.dims, &chunks)?;
        check_capacity(self.limits.max_chunks, chunks.len())?;

        let _writer = self.writer.lock().await;
        let mut tx = self.begin().await?;
        sqlx::query("DELETE FROM chunks")
            .execute(&mut *tx)
            .await
            .map_err(RetrievalError::backend)?;
        Self::write_rows(&mut tx, &chunks).await?;
        tx.commit().await.map_err(RetrievalError::backend)?;
        Ok(())
    }

    async fn all(&self) -> CoreResult<ChunkSnapshot> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query(
            "SELECT source_id, chunk_index, text, embedding FROM chunks ORDER BY seq",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(RetrievalError::backend)?;
        tx.rollback().await.map_err(RetrievalError::backend)?;

        let mut chunks = Vec::with_capacity(rows.len());
        for row in rows {
            let blob: Vec<u8> = row.get("embedding");
            let chunk = Chunk::new(
                row.get::<String, _>("source_id"),
                row.get::<i64, _>("chunk_index") as usize,
                row.get::<String, _>("text"),
                blob_to_vec(&blob),
            )?;
            chunks.push(Arc::new(chunk));
        }

        let dims = chunks.first().map(|c| c.dims()).or(self.limits.dims);
        Ok(ChunkSnapshot::new(chunks, dims))
    }

    async fn count(&self) -> CoreResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(RetrievalError::backend)?;
        Ok(count as usize)
    }
}
