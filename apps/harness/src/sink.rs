//! Append-only CSV output, one file per resume.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::questions::QUESTION_COUNT;
use crate::runner::TrialRecord;

/// Serializes completed trial records to per-resume CSV files.
///
/// Files are never truncated: the header is written only when a file is
/// created, and rows are appended after it. The whole check-header-then-
/// append sequence runs under one process-wide lock so concurrent jobs
/// cannot interleave rows mid-write.
pub struct CsvSink {
    output_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path_for(&self, resume_stem: &str) -> PathBuf {
        self.output_dir.join(format!("{resume_stem}_results.csv"))
    }

    /// Appends one job's records to the resume's results file, creating the
    /// file with a header row when absent. Returns the file path.
    pub async fn append(&self, resume_stem: &str, records: &[TrialRecord]) -> Result<PathBuf> {
        let path = self.path_for(resume_stem);
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("creating output directory {}", self.output_dir.display()))?;

        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("checking {}", path.display()))?;

        let mut block = String::new();
        if !exists {
            block.push_str(&header());
            block.push('\n');
        }
        for record in records {
            block.push_str(&render_row(record));
            block.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        file.write_all(block.as_bytes())
            .await
            .with_context(|| format!("appending to {}", path.display()))?;
        file.flush().await?;

        info!(path = %path.display(), rows = records.len(), "wrote results");
        Ok(path)
    }
}

fn header() -> String {
    let mut columns = vec!["Model".to_string(), "Iteration".to_string()];
    columns.extend((1..=QUESTION_COUNT).map(|i| format!("Q{i}")));
    columns.push("ManipulationCheck".to_string());
    columns.push("ThoughtProcess".to_string());
    columns.join(",")
}

fn render_row(record: &TrialRecord) -> String {
    let mut fields = vec![escape_field(&record.model), record.iteration.to_string()];
    fields.extend(record.scores.iter().map(|score| score.to_string()));
    fields.push(record.manipulation_check.as_str().to_string());
    fields.push(escape_field(&record.thought_process));
    fields.join(",")
}

/// Quotes a field when it contains a delimiter, quote, or line break;
/// embedded quotes are doubled.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ManipulationCheck;
    use std::sync::Arc;

    fn record(model: &str, iteration: usize, thought: &str) -> TrialRecord {
        TrialRecord {
            model: model.to_string(),
            iteration,
            scores: crate::questions::QUESTION_RANGES
                .iter()
                .map(|&(min, _)| min)
                .collect(),
            manipulation_check: ManipulationCheck::Yes,
            thought_process: thought.to_string(),
        }
    }

    #[test]
    fn test_header_columns() {
        let header = header();
        assert!(header.starts_with("Model,Iteration,Q1,Q2,"));
        assert!(header.ends_with("Q17,ManipulationCheck,ThoughtProcess"));
        assert_eq!(header.split(',').count(), 21);
    }

    #[test]
    fn test_escape_field_plain_passthrough() {
        assert_eq!(escape_field("gpt-4o"), "gpt-4o");
    }

    #[test]
    fn test_escape_field_quotes_delimiters() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_render_row_field_count() {
        let row = render_row(&record("gpt-4o", 3, "plain rationale"));
        assert_eq!(row.split(',').count(), 21);
        assert!(row.starts_with("gpt-4o,3,1,"));
        assert!(row.ends_with("YES,plain rationale"));
    }

    #[tokio::test]
    async fn test_header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path());

        sink.append("resume_a", &[record("gpt-4o", 0, "first")])
            .await
            .unwrap();
        let path = sink
            .append("resume_a", &[record("claude-3-opus-latest", 0, "second")])
            .await
            .unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Model,Iteration"));
        assert_eq!(
            contents.matches("Model,Iteration").count(),
            1,
            "header must not repeat"
        );
    }

    #[tokio::test]
    async fn test_concurrent_writers_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(CsvSink::new(dir.path()));

        let a = {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                let records: Vec<TrialRecord> =
                    (0..20).map(|i| record("gpt-4o", i, "a")).collect();
                sink.append("resume_a", &records).await.unwrap();
            })
        };
        let b = {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                let records: Vec<TrialRecord> =
                    (0..20).map(|i| record("mistral-large-latest", i, "b")).collect();
                sink.append("resume_a", &records).await.unwrap();
            })
        };
        a.await.unwrap();
        b.await.unwrap();

        let contents = std::fs::read_to_string(sink.path_for("resume_a")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 41, "one header plus both row sets");
        assert_eq!(contents.matches("Model,Iteration").count(), 1);
        assert_eq!(lines.iter().filter(|l| l.starts_with("gpt-4o,")).count(), 20);
        assert_eq!(
            lines
                .iter()
                .filter(|l| l.starts_with("mistral-large-latest,"))
                .count(),
            20
        );
    }

    #[tokio::test]
    async fn test_quoted_thought_survives_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path());
        let path = sink
            .append(
                "resume_a",
                &[record("gpt-4o", 0, "risky, but \"motivated\"\nworth a call")],
            )
            .await
            .unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("\"risky, but \"\"motivated\"\"\nworth a call\""));
    }
}
