//! Answer generation: retrieve → assemble context → chat completion.
//!
//! The prompt is three messages: a fixed expert-assistant system message,
//! a second system message carrying `Context:\n<assembled chunks>`, and the
//! user's question. When retrieval finds nothing the generator is not
//! called and [`FALLBACK_ANSWER`] is returned instead.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use tootur_core::context::assemble;
use tootur_core::embedding::Embedder;
use tootur_core::models::ScoredChunk;
use tootur_core::search::{retrieve_text, RetrievalParams};
use tootur_core::store::VectorStore;

use crate::config::GenerationConfig;
use crate::retry;

pub const SYSTEM_PROMPT: &str = "You are an expert assistant. Use the provided context to answer \
the user's question accurately, quoting from the context when helpful.";

pub const FALLBACK_ANSWER: &str = "I couldn't find any relevant information to answer your \
question. Could you please rephrase or ask something else?";

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Prompt messages for `question` grounded in `context`.
pub fn build_messages(context: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new("system", SYSTEM_PROMPT),
        ChatMessage::new("system", format!("Context:\n{}", context)),
        ChatMessage::new("user", question),
    ]
}

/// A chat model that turns prompt messages into a reply.
#[async_trait]
pub trait Generator: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGenerator)),
        "openai" => Ok(Box::new(OpenAIChatGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _messages: &[ChatMessage]) -> Result<String> {
        bail!("Generation provider is disabled. Set [generation] provider in config.")
    }
}

/// `POST /v1/chat/completions`, key from `OPENAI_API_KEY`.
pub struct OpenAIChatGenerator {
    model: String,
    max_tokens: u32,
    temperature: f32,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIChatGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_key,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl Generator for OpenAIChatGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });
        let json = retry::post_json(
            &self.client,
            &format!("{}/v1/chat/completions", OPENAI_DEFAULT_URL),
            Some(&self.api_key),
            &body,
            self.max_retries,
            "OpenAI",
        )
        .await?;
        parse_chat_response(&json)
    }
}

fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            anyhow::anyhow!("Invalid chat response: missing choices[0].message.content")
        })?;
    Ok(content.trim().to_string())
}

/// A generated answer and the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<ScoredChunk>,
}

/// Answer `question` from the store's contents.
///
/// Returns [`FALLBACK_ANSWER`] with no sources when nothing clears the
/// retrieval threshold.
pub async fn answer<S, E, G>(
    store: &S,
    embedder: &E,
    generator: &G,
    question: &str,
    params: &RetrievalParams,
) -> Result<Answer>
where
    S: VectorStore + ?Sized,
    E: Embedder + ?Sized,
    G: Generator + ?Sized,
{
    let sources = retrieve_text(store, embedder, question, params).await?;
    if sources.is_empty() {
        info!("no relevant chunks, returning fallback answer");
        return Ok(Answer {
            text: FALLBACK_ANSWER.to_string(),
            sources,
        });
    }

    let context = assemble(&sources);
    debug!(chunks = sources.len(), context_chars = context.len(), "generating answer");
    let text = generator
        .generate(&build_messages(&context, question))
        .await?;

    Ok(Answer { text, sources })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    use tootur_core::models::Chunk;
    use tootur_core::store::InMemoryStore;

    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        fn model_name(&self) -> &str {
            "axis"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> tootur_core::Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| if t.contains("cat") { vec![1.0, 0.0] } else { vec![0.0, 1.0] })
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        fn model_name(&self) -> &str {
            "recording"
        }
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok("Cats are mammals.".to_string())
        }
    }

    #[test]
    fn test_build_messages_layout() {
        let messages = build_messages("Chunk 1: a", "What is a?");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "system");
        assert_eq!(messages[1].content, "Context:\nChunk 1: a");
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[2].content, "What is a?");
    }

    #[test]
    fn test_parse_chat_response_trims() {
        let json = json!({"choices": [{"message": {"role": "assistant", "content": "  hi \n"}}]});
        assert_eq!(parse_chat_response(&json).unwrap(), "hi");
        assert!(parse_chat_response(&json!({"choices": []})).is_err());
    }

    #[tokio::test]
    async fn test_answer_uses_retrieved_context() {
        let store = InMemoryStore::new();
        store
            .insert_many(vec![
                Chunk::new("pets.md", 0, "cats are mammals", vec![1.0, 0.0]).unwrap(),
                Chunk::new("space.md", 0, "rockets burn fuel", vec![0.0, 1.0]).unwrap(),
            ])
            .await
            .unwrap();
        let generator = RecordingGenerator::default();

        let params = RetrievalParams::default();
        let result = answer(&store, &AxisEmbedder, &generator, "tell me about cats", &params)
            .await
            .unwrap();

        assert_eq!(result.text, "Cats are mammals.");
        assert_eq!(result.sources.len(), 1);
        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0][1].content, "Context:\nChunk 1: cats are mammals");
    }

    #[tokio::test]
    async fn test_answer_falls_back_without_calling_generator() {
        let store = InMemoryStore::new();
        let generator = RecordingGenerator::default();

        let params = RetrievalParams::default();
        let result = answer(&store, &AxisEmbedder, &generator, "anything?", &params)
            .await
            .unwrap();

        assert_eq!(result.text, FALLBACK_ANSWER);
        assert!(result.sources.is_empty());
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_generator_errors() {
        assert!(DisabledGenerator.generate(&[]).await.is_err());
    }
}
