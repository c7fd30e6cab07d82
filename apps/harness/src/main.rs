use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use harness::config::Config;
use harness::dispatch::RetryPolicy;
use harness::extract::extract_resumes;
use harness::prompts::build_prompt;
use harness::providers::resolve_targets;
use harness::resume::{list_resume_files, load_resume_text, resume_stem};
use harness::runner::{run_job, JobConfig};
use harness::sink::CsvSink;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume survey harness v{}", env!("CARGO_PKG_VERSION"));
    let start = Instant::now();

    // Optional PDF extraction stage
    if let Some(pdf_dir) = &config.resume_pdf_dir {
        let converted = extract_resumes(pdf_dir, &config.resume_dir)?;
        info!(converted, "PDF extraction stage complete");
    }

    let resumes = list_resume_files(&config.resume_dir)?;
    if resumes.is_empty() {
        warn!(
            "no .txt resumes found in {}, nothing to do",
            config.resume_dir.display()
        );
        return Ok(());
    }
    info!(
        count = resumes.len(),
        "resumes loaded from {}",
        config.resume_dir.display()
    );

    // Resolve each configured model to its provider backend once
    let targets = resolve_targets(&config);
    if targets.is_empty() {
        warn!("no provider credentials configured, nothing to do");
        return Ok(());
    }
    info!(models = targets.len(), "evaluation targets resolved");

    let sink = Arc::new(CsvSink::new(&config.output_dir));
    let job_config = JobConfig {
        iterations_per_file: config.iterations_per_file,
        batch_size: config.batch_size,
        max_workers: config.max_workers,
        retry: RetryPolicy {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        },
    };

    // One job per (resume, model) pair, bounded fan-out
    let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
    let mut jobs = JoinSet::new();

    for resume_path in &resumes {
        let stem = resume_stem(resume_path);
        let text = load_resume_text(resume_path).await?;
        let prompt = build_prompt(&text);

        for target in targets.iter().cloned() {
            let semaphore = Arc::clone(&job_semaphore);
            let sink = Arc::clone(&sink);
            let stem = stem.clone();
            let prompt = prompt.clone();
            jobs.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let report = run_job(&stem, &target.model, &prompt, target.client, job_config).await;
                if !report.records.is_empty() {
                    if let Err(e) = sink.append(&stem, &report.records).await {
                        error!(resume = %stem, model = %target.model, "failed to write results: {e:#}");
                    }
                }
                (stem, target.model, report)
            });
        }
    }

    let mut total_rows = 0usize;
    let mut total_missing = 0usize;
    let mut aborted_jobs = 0usize;
    while let Some(joined) = jobs.join_next().await {
        match joined {
            Ok((stem, model, report)) => {
                total_rows += report.records.len();
                total_missing += report.missing;
                if report.aborted {
                    aborted_jobs += 1;
                    error!(resume = %stem, model, "job aborted: credentials exhausted");
                } else if report.missing > 0 {
                    warn!(
                        resume = %stem,
                        model,
                        missing = report.missing,
                        "job completed short of its iteration target"
                    );
                } else {
                    info!(resume = %stem, model, rows = report.records.len(), "job completed");
                }
            }
            Err(e) => error!("job task failed: {e}"),
        }
    }

    info!(
        rows = total_rows,
        missing = total_missing,
        aborted_jobs,
        elapsed_secs = start.elapsed().as_secs(),
        "run complete"
    );
    Ok(())
}
