//! Drives one (resume, model) job to its target trial count.
//!
//! Each round selects the lowest missing iteration indices, dispatches them
//! concurrently, and marks every outcome completed — valid results record a
//! trial, invalid ones complete their slot with no result and are never
//! retried here (the dispatcher has already spent its own retry budget).
//! That bookkeeping bounds the loop at ceil(iterations / batch) rounds.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::dispatch::{request_with_retry, RetryPolicy};
use crate::errors::EvalError;
use crate::parse::{
    parse_manipulation_check, parse_scores, parse_thought_process, ManipulationCheck,
};
use crate::providers::ModelClient;
use crate::questions::validate_scores;

/// One validated trial of one resume with one model.
#[derive(Debug, Clone)]
pub struct TrialRecord {
    pub model: String,
    pub iteration: usize,
    pub scores: Vec<i64>,
    pub manipulation_check: ManipulationCheck,
    pub thought_process: String,
}

#[derive(Debug, Clone, Copy)]
pub struct JobConfig {
    pub iterations_per_file: usize,
    pub batch_size: usize,
    pub max_workers: usize,
    pub retry: RetryPolicy,
}

/// Outcome of one job. `records` is sorted by iteration index; `missing`
/// counts iteration slots that completed without a usable result.
#[derive(Debug)]
pub struct JobReport {
    pub records: Vec<TrialRecord>,
    pub missing: usize,
    pub rounds: usize,
    /// Credential exhaustion stopped the job before all slots were tried.
    pub aborted: bool,
}

pub async fn run_job(
    resume_id: &str,
    model: &str,
    prompt: &str,
    client: Arc<dyn ModelClient>,
    job: JobConfig,
) -> JobReport {
    let start = Instant::now();
    let mut completed: BTreeSet<usize> = BTreeSet::new();
    let mut records: Vec<TrialRecord> = Vec::new();
    let mut rounds = 0usize;
    let mut aborted = false;

    let semaphore = Arc::new(Semaphore::new(job.max_workers));

    info!(
        resume = resume_id,
        model,
        iterations = job.iterations_per_file,
        "starting job"
    );

    while completed.len() < job.iterations_per_file && !aborted {
        let batch: Vec<usize> = (0..job.iterations_per_file)
            .filter(|i| !completed.contains(i))
            .take(job.batch_size)
            .collect();
        rounds += 1;
        info!(resume = resume_id, model, round = rounds, iterations = ?batch, "dispatching batch");

        let mut join_set = JoinSet::new();
        for &iteration in &batch {
            let semaphore = Arc::clone(&semaphore);
            let client = Arc::clone(&client);
            let model = model.to_string();
            let prompt = prompt.to_string();
            let retry = job.retry;
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let outcome = request_with_retry(client.as_ref(), &model, &prompt, retry).await;
                (iteration, outcome)
            });
        }

        let mut collected: HashSet<usize> = HashSet::new();
        while let Some(joined) = join_set.join_next().await {
            let (iteration, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    error!(resume = resume_id, model, "trial task failed to join: {e}");
                    continue;
                }
            };
            collected.insert(iteration);

            match outcome {
                Ok(raw) => match evaluate_response(model, iteration, &raw) {
                    Ok(record) => {
                        records.push(record);
                        completed.insert(iteration);
                        info!(resume = resume_id, model, iteration, "trial succeeded");
                    }
                    Err(err) => {
                        error!(
                            resume = resume_id,
                            model, iteration, "trial result rejected: {err}"
                        );
                        completed.insert(iteration);
                    }
                },
                Err(EvalError::CredentialsExhausted) => {
                    error!(
                        resume = resume_id,
                        model, iteration, "credentials exhausted, aborting job"
                    );
                    aborted = true;
                }
                Err(err) => {
                    error!(resume = resume_id, model, iteration, "trial failed: {err}");
                    completed.insert(iteration);
                }
            }
        }

        // A slot whose task vanished (panic) still completes, so the round
        // loop cannot spin on it forever.
        for &iteration in &batch {
            if !collected.contains(&iteration) && !aborted {
                completed.insert(iteration);
            }
        }

        info!(
            resume = resume_id,
            model,
            completed = completed.len(),
            total = job.iterations_per_file,
            elapsed = %format_elapsed(start.elapsed()),
            "progress"
        );
    }

    records.sort_by_key(|record| record.iteration);
    let missing = job.iterations_per_file - records.len();
    if missing > 0 {
        warn!(
            resume = resume_id,
            model, missing, "job finished short of its iteration target"
        );
    }

    JobReport {
        records,
        missing,
        rounds,
        aborted,
    }
}

/// Parses and validates one raw response into a trial record.
fn evaluate_response(model: &str, iteration: usize, raw: &str) -> Result<TrialRecord, EvalError> {
    if raw.trim().is_empty() {
        return Err(EvalError::EmptyResponse);
    }
    let scores = validate_scores(parse_scores(raw)?)?;
    Ok(TrialRecord {
        model: model.to_string(),
        iteration,
        scores,
        manipulation_check: parse_manipulation_check(raw),
        thought_process: parse_thought_process(raw),
    })
}

/// HH:MM:SS rendering for progress lines.
fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
