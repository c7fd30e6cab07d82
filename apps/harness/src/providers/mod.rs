//! Model provider backends.
//!
//! Three provider families (Anthropic, OpenAI, Mistral) behind one
//! [`ModelClient`] trait. The families differ only in wire detail; every
//! client classifies failures into the same retry-relevant categories, and
//! the dispatcher's policy depends only on that classification.

pub mod anthropic;
pub mod mistral;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use mistral::MistralClient;
pub use openai::OpenAiClient;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::credentials::CredentialPool;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited (status {status})")]
    RateLimited { status: u16 },

    #[error("transient server error (status {status}): {message}")]
    Transient { status: u16, message: String },

    #[error("quota exhausted on key {key_index}: {message}")]
    QuotaExhausted { key_index: usize, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned empty content")]
    EmptyContent,
}

impl ProviderError {
    /// Errors worth a delayed retry on the same credentials: rate limits,
    /// server-side overload, and transport failures.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::Transient { .. }
                | ProviderError::Http(_)
        )
    }
}

/// Maps a non-success response to the retry-relevant error category.
///
/// Quota signatures are checked first: providers surface quota exhaustion
/// under a 429 as well, and those must rotate credentials rather than wait.
pub(crate) fn classify_response(status: u16, message: String, key_index: usize) -> ProviderError {
    let lower = message.to_lowercase();
    if lower.contains("insufficient_quota") || lower.contains("billing_hard_limit_reached") {
        return ProviderError::QuotaExhausted { key_index, message };
    }
    if status == 429 {
        return ProviderError::RateLimited { status };
    }
    if status >= 500 || lower.contains("overloaded") {
        return ProviderError::Transient { status, message };
    }
    ProviderError::Api { status, message }
}

/// One evaluation backend. `submit` sends a single prompt for a single model
/// and returns the raw response text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn submit(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;

    /// Rotates to the next credential set after quota exhaustion was observed
    /// on key `observed`. Returns false when no credentials remain; the
    /// default implementation is for families without a rotating pool.
    fn rotate_credentials(&self, observed: usize) -> bool {
        let _ = observed;
        false
    }
}

/// HTTP client shared configuration for all provider families.
pub(crate) fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .expect("Failed to build HTTP client")
}

/// OpenAI-compatible chat completion response, also returned by Mistral.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    pub fn text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
    }
}

/// Standard `{"error": {"message": ...}}` error body shared by all three
/// provider APIs. Falls back to the raw body when it does not parse.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub(crate) fn error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// One (model, backend) pairing, resolved once at startup.
#[derive(Clone)]
pub struct ModelTarget {
    pub model: String,
    pub client: Arc<dyn ModelClient>,
}

/// Builds the evaluation targets for every configured model whose provider
/// family has usable credentials. Families with models but no key are
/// skipped with a warning.
pub fn resolve_targets(config: &Config) -> Vec<ModelTarget> {
    let mut targets = Vec::new();

    match CredentialPool::new(config.openai_api_keys.clone()) {
        Some(pool) => {
            let client: Arc<dyn ModelClient> = Arc::new(OpenAiClient::new(pool));
            for model in &config.openai_models {
                targets.push(ModelTarget {
                    model: model.clone(),
                    client: Arc::clone(&client),
                });
            }
        }
        None if !config.openai_models.is_empty() => {
            warn!("OPENAI_API_KEY not set, skipping OpenAI models");
        }
        None => {}
    }

    match &config.anthropic_api_key {
        Some(key) if !key.trim().is_empty() => {
            let client: Arc<dyn ModelClient> = Arc::new(AnthropicClient::new(key.clone()));
            for model in &config.anthropic_models {
                targets.push(ModelTarget {
                    model: model.clone(),
                    client: Arc::clone(&client),
                });
            }
        }
        _ if !config.anthropic_models.is_empty() => {
            warn!("ANTHROPIC_API_KEY not set, skipping Anthropic models");
        }
        _ => {}
    }

    match &config.mistral_api_key {
        Some(key) if !key.trim().is_empty() => {
            let client: Arc<dyn ModelClient> = Arc::new(MistralClient::new(key.clone()));
            for model in &config.mistral_models {
                targets.push(ModelTarget {
                    model: model.clone(),
                    client: Arc::clone(&client),
                });
            }
        }
        _ if !config.mistral_models.is_empty() => {
            warn!("MISTRAL_API_KEY not set, skipping Mistral models");
        }
        _ => {}
    }

    targets
}
