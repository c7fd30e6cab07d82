use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{ensure, Context, Result};

/// Default model rosters per provider family. Overridable via the
/// `*_MODELS` environment variables (comma-separated).
pub const DEFAULT_OPENAI_MODELS: &[&str] = &[
    "gpt-3.5-turbo-16k",
    "gpt-4o",
    "gpt-4o-mini",
    "o1",
    "o3-mini",
    "o4-mini",
];

pub const DEFAULT_ANTHROPIC_MODELS: &[&str] = &[
    "claude-3-5-sonnet-latest",
    "claude-3-5-haiku-latest",
    "claude-3-sonnet-20240229",
    "claude-3-7-sonnet-latest",
    "claude-3-haiku-20240307",
    "claude-3-opus-latest",
];

pub const DEFAULT_MISTRAL_MODELS: &[&str] = &[
    "ministral-3b-latest",
    "ministral-8b-latest",
    "mistral-large-latest",
    "mistral-small-latest",
];

/// Run configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub resume_dir: PathBuf,
    /// When set, PDFs in this directory are converted to text files in
    /// `resume_dir` before the survey starts.
    pub resume_pdf_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub iterations_per_file: usize,
    pub batch_size: usize,
    pub max_workers: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub max_concurrent_jobs: usize,
    /// Primary key first, then backups; quota exhaustion rotates through them.
    pub openai_api_keys: Vec<String>,
    pub anthropic_api_key: Option<String>,
    pub mistral_api_key: Option<String>,
    pub openai_models: Vec<String>,
    pub anthropic_models: Vec<String>,
    pub mistral_models: Vec<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            resume_dir: env_or("RESUME_DIR", "resumes/txt_extracted").into(),
            resume_pdf_dir: std::env::var("RESUME_PDF_DIR").ok().map(Into::into),
            output_dir: env_or("OUTPUT_DIR", "output_csvs").into(),
            iterations_per_file: parse_env("ITERATIONS_PER_FILE", 100)?,
            batch_size: parse_env("BATCH_SIZE", 15)?,
            max_workers: parse_env("MAX_WORKERS", 5)?,
            max_retries: parse_env("MAX_RETRIES", 10)?,
            retry_delay: Duration::from_secs(parse_env("RETRY_DELAY_SECS", 60)?),
            max_concurrent_jobs: parse_env("MAX_CONCURRENT_JOBS", 3)?,
            openai_api_keys: [
                std::env::var("OPENAI_API_KEY").ok(),
                std::env::var("OPENAI_BACKUP_KEY").ok(),
            ]
            .into_iter()
            .flatten()
            .filter(|k| !k.trim().is_empty())
            .collect(),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            mistral_api_key: std::env::var("MISTRAL_API_KEY").ok(),
            openai_models: model_list("OPENAI_MODELS", DEFAULT_OPENAI_MODELS),
            anthropic_models: model_list("ANTHROPIC_MODELS", DEFAULT_ANTHROPIC_MODELS),
            mistral_models: model_list("MISTRAL_MODELS", DEFAULT_MISTRAL_MODELS),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        ensure!(config.iterations_per_file > 0, "ITERATIONS_PER_FILE must be at least 1");
        ensure!(config.batch_size > 0, "BATCH_SIZE must be at least 1");
        ensure!(config.max_workers > 0, "MAX_WORKERS must be at least 1");
        ensure!(config.max_retries > 0, "MAX_RETRIES must be at least 1");
        ensure!(config.max_concurrent_jobs > 0, "MAX_CONCURRENT_JOBS must be at least 1");

        Ok(config)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn model_list(key: &str, defaults: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) => split_models(&raw),
        Err(_) => defaults.iter().map(|m| m.to_string()).collect(),
    }
}

fn split_models(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
