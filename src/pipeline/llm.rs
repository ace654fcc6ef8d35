//! Schema-guided extraction: send document text + schema to the model.
//!
//! This module builds the prompt (via [`crate::prompts`]), calls the model
//! in deterministic mode and returns the raw response text. It never parses
//! JSON; the model's output is untrusted and parsing belongs to
//! [`crate::pipeline::aggregate`].
//!
//! ## Retry Strategy
//!
//! Retries are off by default (`max_retries = 0`). When enabled they wrap
//! only the model call, with exponential backoff
//! (`retry_backoff_ms * 2^(attempt-1)`): 500 ms → 1 s → 2 s for three
//! retries at the default base. A single wait never exceeds
//! [`MAX_BACKOFF_MS`].

use crate::config::ExtractionConfig;
use crate::error::DocumentError;
use crate::prompts::build_extraction_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Sampling temperature for every extraction call. Zero asks for the most
/// probable continuation, so identical inputs give identical outputs on a
/// deterministic backend.
pub const DETERMINISTIC_TEMPERATURE: f32 = 0.0;

/// Upper bound on one retry wait.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// A completion returned by a [`ModelService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCompletion {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl ModelCompletion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            prompt_tokens: 0,
            completion_tokens: 0,
        }
    }
}

/// Transport, auth and rate-limit failures, collapsed into one kind.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ModelServiceError(pub String);

/// A stateless text-completion service used in deterministic mode.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Model identifier, for logs and reports.
    fn model_id(&self) -> &str;

    /// Complete `prompt` at temperature 0. No conversation state is kept
    /// between calls.
    async fn complete(&self, prompt: &str) -> Result<ModelCompletion, ModelServiceError>;
}

/// [`ModelService`] backed by an `edgequake-llm` provider.
pub struct LlmModelService {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
}

impl LlmModelService {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
        }
    }
}

/// Build `CompletionOptions`; temperature is always zero.
fn build_options(max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(DETERMINISTIC_TEMPERATURE),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

/// Wait before retry number `attempt` (1-based), saturating at
/// [`MAX_BACKOFF_MS`].
pub fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 2u64
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

#[async_trait]
impl ModelService for LlmModelService {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<ModelCompletion, ModelServiceError> {
        let messages = vec![ChatMessage::user(prompt)];
        let options = build_options(self.max_tokens);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ModelServiceError(e.to_string()))?;

        Ok(ModelCompletion {
            content: response.content,
            prompt_tokens: response.prompt_tokens as usize,
            completion_tokens: response.completion_tokens as usize,
        })
    }
}

/// Raw model output for one document plus call accounting.
#[derive(Debug, Clone)]
pub struct RawModelOutput {
    /// The response text, verbatim.
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub retries: u32,
    pub duration_ms: u64,
}

/// Prompt the model with the document text and schema.
///
/// Returns the raw response unchanged. Fails with
/// [`DocumentError::ModelService`] once the retry budget is spent.
pub async fn extract_structured(
    service: &dyn ModelService,
    document_index: usize,
    document_text: &str,
    schema: &str,
    config: &ExtractionConfig,
) -> Result<RawModelOutput, DocumentError> {
    let start = Instant::now();
    let prompt = build_extraction_prompt(config.system_prompt.as_deref(), document_text, schema);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_delay_ms(config.retry_backoff_ms, attempt);
            warn!(
                "Document {}: retry {}/{} after {}ms",
                document_index, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match service.complete(&prompt).await {
            Ok(completion) => {
                let duration = start.elapsed();
                debug!(
                    "Document {}: {} via {}: {} prompt tokens, {} completion tokens, {:?}",
                    document_index,
                    completion.content.len(),
                    service.model_id(),
                    completion.prompt_tokens,
                    completion.completion_tokens,
                    duration
                );
                return Ok(RawModelOutput {
                    content: completion.content,
                    prompt_tokens: completion.prompt_tokens,
                    completion_tokens: completion.completion_tokens,
                    retries: attempt,
                    duration_ms: duration.as_millis() as u64,
                });
            }
            Err(e) => {
                warn!(
                    "Document {}: model attempt {} failed — {}",
                    document_index,
                    attempt + 1,
                    e
                );
                last_err = Some(e.to_string());
            }
        }
    }

    Err(DocumentError::ModelService {
        retries: config.max_retries,
        detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}
