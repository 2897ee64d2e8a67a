//! Embedding providers.
//!
//! Concrete [`Embedder`] implementations selected by `[embedding] provider`:
//! - **[`DisabledProvider`]**: every call fails; used when embeddings are not configured.
//! - **[`OpenAIProvider`]**: `POST /v1/embeddings`, key from `OPENAI_API_KEY`.
//! - **[`OllamaProvider`]**: `POST {url}/api/embed` on a local Ollama instance.
//!
//! Both HTTP providers go through [`retry::post_json`](crate::retry::post_json).
//!
//! ```rust,no_run
//! # use tootur::config::EmbeddingConfig;
//! # use tootur::embedding::create_provider;
//! # use tootur_core::embedding::Embedder;
//! let config = EmbeddingConfig::default(); // provider = "disabled"
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.model_name(), "disabled");
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use tootur_core::embedding::Embedder;
use tootur_core::RetrievalError;

use crate::config::EmbeddingConfig;
use crate::retry;

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com";
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Build the provider named in the configuration.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "openai" => Ok(Box::new(OpenAIProvider::new(config)?)),
        "ollama" => Ok(Box::new(OllamaProvider::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

fn unavailable(err: anyhow::Error) -> RetrievalError {
    RetrievalError::EmbeddingUnavailable(format!("{:#}", err))
}

fn http_client(config: &EmbeddingConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

/// Model name and dims, both required for any real provider.
fn model_and_dims(config: &EmbeddingConfig, provider: &str) -> Result<(String, usize)> {
    let model = config
        .model
        .clone()
        .ok_or_else(|| anyhow::anyhow!("embedding.model required for {} provider", provider))?;
    let dims = config
        .dims
        .ok_or_else(|| anyhow::anyhow!("embedding.dims required for {} provider", provider))?;
    Ok((model, dims))
}

// ============ Disabled Provider ============

/// Provider for `provider = "disabled"`. Any attempt to embed fails.
pub struct DisabledProvider;

#[async_trait]
impl Embedder for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _texts: &[String]) -> tootur_core::Result<Vec<Vec<f32>>> {
        Err(RetrievalError::EmbeddingUnavailable(
            "embedding provider is disabled; set [embedding] provider in config".into(),
        ))
    }
}

// ============ OpenAI Provider ============

pub struct OpenAIProvider {
    model: String,
    dims: usize,
    url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// # Errors
    ///
    /// Fails if `model` or `dims` is not set in config, or if
    /// `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model, dims) = model_and_dims(config, "OpenAI")?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            model,
            dims,
            url: config
                .url
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_URL.to_string()),
            api_key,
            max_retries: config.max_retries,
            client: http_client(config)?,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> tootur_core::Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = retry::post_json(
            &self.client,
            &format!("{}/v1/embeddings", self.url.trim_end_matches('/')),
            Some(&self.api_key),
            &body,
            self.max_retries,
            "OpenAI",
        )
        .await
        .map_err(unavailable)?;
        parse_openai_response(&json).map_err(unavailable)
    }
}

/// Extract `data[].embedding`, ordered by each item's `index`.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);
        let embedding = item
            .get("embedding")
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing embedding"))?;
        indexed.push((index, parse_vector(embedding)?));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama Provider ============

/// Requires Ollama running with an embedding model pulled
/// (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaProvider {
    model: String,
    dims: usize,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model, dims) = model_and_dims(config, "Ollama")?;
        Ok(Self {
            model,
            dims,
            url: config
                .url
                .clone()
                .unwrap_or_else(|| OLLAMA_DEFAULT_URL.to_string()),
            max_retries: config.max_retries,
            client: http_client(config)?,
        })
    }
}

#[async_trait]
impl Embedder for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> tootur_core::Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = retry::post_json(
            &self.client,
            &format!("{}/api/embed", self.url.trim_end_matches('/')),
            None,
            &body,
            self.max_retries,
            "Ollama",
        )
        .await
        .map_err(unavailable)?;
        parse_ollama_response(&json).map_err(unavailable)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    json.get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing embeddings array"))?
        .iter()
        .map(parse_vector)
        .collect()
}

/// A JSON array of numbers as `f32`s. Non-numeric entries are an error
/// rather than a silent zero.
fn parse_vector(value: &serde_json::Value) -> Result<Vec<f32>> {
    value
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Invalid embedding: not an array"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| anyhow::anyhow!("Invalid embedding: non-numeric component"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_disabled_provider_fails() {
        let provider = create_provider(&EmbeddingConfig::default()).unwrap();
        assert_eq!(provider.model_name(), "disabled");
        let err = provider.embed(&["hello".to_string()]).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmbeddingUnavailable(_)));
    }

    #[test]
    fn test_ollama_requires_model_and_dims() {
        let config = EmbeddingConfig {
            provider: "ollama".into(),
            ..EmbeddingConfig::default()
        };
        assert!(OllamaProvider::new(&config).is_err());

        let config = EmbeddingConfig {
            provider: "ollama".into(),
            model: Some("nomic-embed-text".into()),
            dims: Some(768),
            ..EmbeddingConfig::default()
        };
        let provider = OllamaProvider::new(&config).unwrap();
        assert_eq!(provider.dims(), 768);
        assert_eq!(provider.url, OLLAMA_DEFAULT_URL);

        let config = EmbeddingConfig {
            url: Some("http://gpu-box:11434".into()),
            ..config
        };
        assert_eq!(OllamaProvider::new(&config).unwrap().url, "http://gpu-box:11434");
    }

    #[test]
    fn test_parse_openai_orders_by_index() {
        let json = json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        });
        let vectors = parse_openai_response(&json).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_parse_openai_missing_data() {
        assert!(parse_openai_response(&json!({"error": "nope"})).is_err());
    }

    #[test]
    fn test_parse_ollama() {
        let json = json!({"embeddings": [[0.5, 0.25], [1.0, -1.0]]});
        assert_eq!(
            parse_ollama_response(&json).unwrap(),
            vec![vec![0.5, 0.25], vec![1.0, -1.0]]
        );
    }

    #[test]
    fn test_non_numeric_component_rejected() {
        let json = json!({"embeddings": [[0.5, "x"]]});
        assert!(parse_ollama_response(&json).is_err());
    }
}
