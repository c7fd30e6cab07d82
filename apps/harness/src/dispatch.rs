//! Bounded retry around a single provider request.

use std::time::Duration;

use tracing::{info, warn};

use crate::errors::EvalError;
use crate::providers::{ModelClient, ProviderError};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

/// Issues one evaluation request, retrying within a bounded budget.
///
/// Rate-limit and transient failures sleep `retry_delay` and consume an
/// attempt. Quota exhaustion rotates the provider's credential pool and
/// retries the same attempt without consuming one; when no credentials
/// remain it fails the whole job. Any other error propagates immediately.
pub async fn request_with_retry(
    client: &dyn ModelClient,
    model: &str,
    prompt: &str,
    policy: RetryPolicy,
) -> Result<String, EvalError> {
    let mut attempt = 0u32;

    while attempt < policy.max_retries {
        match client.submit(model, prompt).await {
            Ok(text) => return Ok(text),
            Err(err) if err.is_retryable() => {
                attempt += 1;
                warn!(
                    model,
                    attempt,
                    "retryable provider error: {err}; waiting {}s",
                    policy.retry_delay.as_secs()
                );
                if attempt < policy.max_retries {
                    tokio::time::sleep(policy.retry_delay).await;
                }
            }
            Err(ProviderError::QuotaExhausted { key_index, message }) => {
                warn!(model, key_index, "credential quota exhausted: {message}");
                if client.rotate_credentials(key_index) {
                    info!(model, "retrying with rotated credentials");
                } else {
                    return Err(EvalError::CredentialsExhausted);
                }
            }
            Err(err) => return Err(EvalError::Provider(err)),
        }
    }

    Err(EvalError::ExhaustedRetries {
        attempts: policy.max_retries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn quick_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            retry_delay: Duration::from_millis(1),
        }
    }

    /// Scripted client: pops one outcome per submit call.
    struct ScriptedClient {
        outcomes: Mutex<VecDeque<Result<String, ProviderError>>>,
        submits: AtomicUsize,
        rotations_left: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(outcomes: Vec<Result<String, ProviderError>>, rotations_left: usize) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                submits: AtomicUsize::new(0),
                rotations_left: AtomicUsize::new(rotations_left),
            }
        }

        fn submit_count(&self) -> usize {
            self.submits.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn submit(&self, _model: &str, _prompt: &str) -> Result<String, ProviderError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyContent))
        }

        fn rotate_credentials(&self, _observed: usize) -> bool {
            self.rotations_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited { status: 429 }
    }

    fn quota(key_index: usize) -> ProviderError {
        ProviderError::QuotaExhausted {
            key_index,
            message: "insufficient_quota".to_string(),
        }
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let client = ScriptedClient::new(vec![Err(rate_limited()), Ok("4".to_string())], 0);
        let text = request_with_retry(&client, "gpt-4o", "p", quick_policy(3))
            .await
            .unwrap();
        assert_eq!(text, "4");
        assert_eq!(client.submit_count(), 2);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausts() {
        let client = ScriptedClient::new(
            vec![Err(rate_limited()), Err(rate_limited()), Err(rate_limited())],
            0,
        );
        let err = request_with_retry(&client, "gpt-4o", "p", quick_policy(3))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::ExhaustedRetries { attempts: 3 }));
        assert_eq!(client.submit_count(), 3);
    }

    #[tokio::test]
    async fn test_rotation_does_not_consume_attempt() {
        // One attempt in the budget, yet quota-rotate-retry still succeeds.
        let client = ScriptedClient::new(vec![Err(quota(0)), Ok("4".to_string())], 1);
        let text = request_with_retry(&client, "gpt-4o", "p", quick_policy(1))
            .await
            .unwrap();
        assert_eq!(text, "4");
        assert_eq!(client.submit_count(), 2);
    }

    #[tokio::test]
    async fn test_rotation_exhaustion_is_fatal() {
        let client = ScriptedClient::new(vec![Err(quota(0)), Err(quota(1))], 1);
        let err = request_with_retry(&client, "gpt-4o", "p", quick_policy(5))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::CredentialsExhausted));
        assert_eq!(client.submit_count(), 2);
    }

    #[tokio::test]
    async fn test_fatal_api_error_propagates_immediately() {
        let client = ScriptedClient::new(
            vec![Err(ProviderError::Api {
                status: 401,
                message: "invalid api key".to_string(),
            })],
            0,
        );
        let err = request_with_retry(&client, "gpt-4o", "p", quick_policy(5))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::Provider(ProviderError::Api { .. })));
        assert_eq!(client.submit_count(), 1);
    }
}
