//! OpenAI chat completions backend with a rotating credential pool.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{
    build_http_client, classify_response, error_message, ChatResponse, ModelClient, ProviderError,
};
use crate::credentials::CredentialPool;
use crate::prompts::SYSTEM_PROMPT;
use crate::schema::openai_response_format;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Reasoning models: instructions go in a `developer` role message and the
/// temperature parameter is not accepted.
const O_SERIES: &[&str] = &["o1", "o3-mini", "o4-mini"];

pub struct OpenAiClient {
    client: reqwest::Client,
    pool: CredentialPool,
}

impl OpenAiClient {
    pub fn new(pool: CredentialPool) -> Self {
        Self {
            client: build_http_client(),
            pool,
        }
    }
}

/// 3.5-era chat models predate structured outputs.
fn supports_json_schema(model: &str) -> bool {
    !model.starts_with("gpt-3.5")
}

fn request_body(model: &str, prompt: &str) -> serde_json::Value {
    let system_role = if O_SERIES.contains(&model) {
        "developer"
    } else {
        "system"
    };

    let mut body = json!({
        "model": model,
        "messages": [
            {"role": system_role, "content": SYSTEM_PROMPT},
            {"role": "user", "content": prompt}
        ],
    });
    if !O_SERIES.contains(&model) {
        body["temperature"] = json!(0);
    }
    if supports_json_schema(model) {
        body["response_format"] = openai_response_format();
    }
    body
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn submit(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let (key_index, api_key) = self.pool.active();

        let response = self
            .client
            .post(API_URL)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request_body(model, prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_response(
                status.as_u16(),
                error_message(body),
                key_index,
            ));
        }

        let parsed: ChatResponse = response.json().await?;
        debug!(model, "openai call succeeded");
        parsed.text().ok_or(ProviderError::EmptyContent)
    }

    fn rotate_credentials(&self, observed: usize) -> bool {
        self.pool.rotate_from(observed)
    }
}
