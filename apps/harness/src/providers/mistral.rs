//! Mistral chat completions backend.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{
    build_http_client, classify_response, error_message, ChatResponse, ModelClient, ProviderError,
};
use crate::prompts::SYSTEM_PROMPT;
use crate::schema::mistral_response_format;

const API_URL: &str = "https://api.mistral.ai/v1/chat/completions";

pub struct MistralClient {
    client: reqwest::Client,
    api_key: String,
}

impl MistralClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: build_http_client(),
            api_key,
        }
    }
}

fn request_body(model: &str, prompt: &str) -> serde_json::Value {
    // No separate system field in this request shape; prepend instead.
    json!({
        "model": model,
        "temperature": 0.0,
        "response_format": mistral_response_format(),
        "messages": [
            {"role": "user", "content": format!("{SYSTEM_PROMPT}\n\n{prompt}")}
        ],
    })
}

#[async_trait]
impl ModelClient for MistralClient {
    async fn submit(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body(model, prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_response(status.as_u16(), error_message(body), 0));
        }

        let parsed: ChatResponse = response.json().await?;
        debug!(model, "mistral call succeeded");
        parsed.text().ok_or(ProviderError::EmptyContent)
    }
}
