//! Offline CSV repair pass.
//!
//! Re-derives a strict numeric-only `Model, Iteration, Q1..Q17` table from
//! already-produced results files. Cells are free text in the worst case
//! (models that answered with labels or sentences), so numbers are located
//! best-effort: a leading integer, else the first integer anywhere in the
//! cell. Rows yielding fewer than 17 numbers keep empty score cells.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use harness::questions::QUESTION_COUNT;
use harness::sink::escape_field;

fn int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").unwrap())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let input_dir = std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "output_csvs".to_string());
    let output_dir = std::env::var("CLEANED_OUTPUT_DIR")
        .unwrap_or_else(|_| format!("{}_cleaned", input_dir.trim_end_matches('/')));

    let input_dir = Path::new(&input_dir);
    let output_dir = Path::new(&output_dir);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let mut cleaned = 0usize;
    for entry in std::fs::read_dir(input_dir)
        .with_context(|| format!("reading {}", input_dir.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
            continue;
        }
        let target = output_dir.join(path.file_name().expect("csv file has a name"));
        match clean_file(&path, &target) {
            Ok(rows) => {
                info!(input = %path.display(), output = %target.display(), rows, "cleaned");
                cleaned += 1;
            }
            Err(e) => warn!(input = %path.display(), "cleaning failed: {e:#}"),
        }
    }

    info!(files = cleaned, "cleanup complete");
    Ok(())
}

/// Cleans one results file; returns the number of data rows written.
fn clean_file(input: &Path, output: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let records = parse_records(&content);
    let Some((header, rows)) = records.split_first() else {
        bail!("empty file");
    };
    if header.first().map(String::as_str) != Some("Model") {
        warn!(input = %input.display(), "unexpected header, assuming Model,Iteration column order");
    }

    let mut out = String::new();
    out.push_str(&cleaned_header());
    out.push('\n');

    let mut written = 0usize;
    for (idx, row) in rows.iter().enumerate() {
        if row.len() < 2 {
            warn!(row = idx, "too few columns, skipping");
            continue;
        }

        let numbers: Vec<i64> = row[2..]
            .iter()
            .filter_map(|cell| extract_number_from_cell(cell))
            .collect();

        let mut fields = vec![escape_field(&row[0]), escape_field(&row[1])];
        if numbers.len() >= QUESTION_COUNT {
            fields.extend(numbers[..QUESTION_COUNT].iter().map(|n| n.to_string()));
        } else {
            warn!(
                row = idx,
                found = numbers.len(),
                expected = QUESTION_COUNT,
                "row short of numbers, leaving scores empty"
            );
            fields.extend(std::iter::repeat(String::new()).take(QUESTION_COUNT));
        }
        out.push_str(&fields.join(","));
        out.push('\n');
        written += 1;
    }

    std::fs::write(output, out).with_context(|| format!("writing {}", output.display()))?;
    Ok(written)
}

fn cleaned_header() -> String {
    let mut columns = vec!["Model".to_string(), "Iteration".to_string()];
    columns.extend((1..=QUESTION_COUNT).map(|i| format!("Q{i}")));
    columns.join(",")
}

/// Best-effort integer extraction from one cell.
fn extract_number_from_cell(cell: &str) -> Option<i64> {
    let cell = cell.trim().trim_matches('"');
    int_re().find(cell).and_then(|m| m.as_str().parse().ok())
}

/// Minimal quote-aware CSV reader. Quoted fields may contain commas, line
/// breaks, and doubled quotes; records are split on newlines outside quotes.
fn parse_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => record.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                _ => field.push(c),
            }
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}
