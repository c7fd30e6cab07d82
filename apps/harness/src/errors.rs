use thiserror::Error;

use crate::providers::ProviderError;

/// Trial- and job-level error type.
///
/// `Parse`, `ScoreCount`, `ScoreRange`, `EmptyResponse`, and
/// `ExhaustedRetries` are trial-scoped: the runner logs them and marks the
/// iteration slot completed without a result. `CredentialsExhausted` is
/// job-scoped and aborts the remaining iterations for the (resume, model)
/// pair.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("could not extract {expected} valid scores, found {found} numbers: {numbers:?}")]
    Parse {
        expected: usize,
        found: usize,
        numbers: Vec<i64>,
    },

    #[error("expected {expected} scores, got {got}")]
    ScoreCount { expected: usize, got: usize },

    #[error("Q{question} score {value} out of valid range {min}-{max}")]
    ScoreRange {
        question: usize,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("empty response from model")]
    EmptyResponse,

    #[error("max retries exceeded after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error("all API credentials exhausted")]
    CredentialsExhausted,

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}
