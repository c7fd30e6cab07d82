//! Score vector extraction: structured decode first, then line-oriented text.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::{decode_json, int_from};
use crate::errors::EvalError;
use crate::questions::QUESTION_COUNT;

fn q_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[Qq]\d+[:\-.]?\s*").unwrap())
}

fn num_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+[.)]\s*").unwrap())
}

fn scale_digit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([1-7])\b").unwrap())
}

/// Extracts exactly [`QUESTION_COUNT`] integers from a raw model response.
///
/// Strategies, first success wins:
/// 1. structured decode — flat `q1..q17` keys, a `scores` array, the nested
///    `resume_evaluation.questions` wrapper, a bare top-level array, or a
///    recursive search for any 17-integer array;
/// 2. line-oriented — one standalone digit 1-7 per labeled line;
/// 3. reconciliation — first 17 on overflow (warned), whole-text rescan on
///    underflow, error otherwise.
pub fn parse_scores(raw: &str) -> Result<Vec<i64>, EvalError> {
    if raw.trim().is_empty() {
        return Err(EvalError::EmptyResponse);
    }

    if let Some(value) = decode_json(raw) {
        if let Some(numbers) = scores_from_value(&value) {
            return Ok(numbers);
        }
    }

    let mut numbers = Vec::new();
    for line in raw.trim().split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line = q_label_re().replace(line, "");
        let line = num_label_re().replace(&line, "");
        if let Some(cap) = scale_digit_re().captures(&line) {
            numbers.push(cap[1].parse::<i64>().unwrap());
        }
    }

    match numbers.len().cmp(&QUESTION_COUNT) {
        Ordering::Equal => Ok(numbers),
        Ordering::Greater => {
            warn!(
                found = numbers.len(),
                expected = QUESTION_COUNT,
                "found more numbers than questions, taking the first {QUESTION_COUNT}"
            );
            numbers.truncate(QUESTION_COUNT);
            Ok(numbers)
        }
        Ordering::Less => {
            // The per-line pass missed some answers; rescan the whole text.
            let rescanned: Vec<i64> = scale_digit_re()
                .captures_iter(raw)
                .map(|cap| cap[1].parse::<i64>().unwrap())
                .collect();
            if rescanned.len() >= QUESTION_COUNT {
                return Ok(rescanned[..QUESTION_COUNT].to_vec());
            }
            Err(EvalError::Parse {
                expected: QUESTION_COUNT,
                found: numbers.len(),
                numbers,
            })
        }
    }
}

/// Structured-decode strategies over a parsed JSON value, in priority order.
fn scores_from_value(value: &Value) -> Option<Vec<i64>> {
    match value {
        Value::Object(map) => {
            // Flat q1..q17 properties, accepted only when every key is present.
            if map.contains_key("q1") && map.contains_key(&format!("q{QUESTION_COUNT}")) {
                let mut numbers = Vec::with_capacity(QUESTION_COUNT);
                for i in 1..=QUESTION_COUNT {
                    match map.get(&format!("q{i}")).and_then(int_from) {
                        Some(n) => numbers.push(n),
                        None => break,
                    }
                }
                if numbers.len() == QUESTION_COUNT {
                    return Some(numbers);
                }
            }

            if let Some(Value::Array(items)) = map.get("scores") {
                if let Some(numbers) = int_array(items) {
                    return Some(numbers);
                }
            }

            // Nested JSON-mode wrapper: resume_evaluation.questions.
            if let Some(Value::Object(nested)) = map.get("resume_evaluation") {
                if let Some(Value::Array(items)) = nested.get("questions") {
                    if let Some(numbers) = int_array(items) {
                        return Some(numbers);
                    }
                }
            }

            find_score_array(value)
        }
        Value::Array(items) => int_array(items),
        _ => None,
    }
}

/// All-elements-coercible array of exactly [`QUESTION_COUNT`] integers.
fn int_array(items: &[Value]) -> Option<Vec<i64>> {
    let numbers: Option<Vec<i64>> = items.iter().map(int_from).collect();
    numbers.filter(|n| n.len() == QUESTION_COUNT)
}

/// Recursive search through nested objects for the first qualifying array.
/// Arrays of non-scalar elements are not descended into.
fn find_score_array(value: &Value) -> Option<Vec<i64>> {
    match value {
        Value::Array(items) => {
            if items
                .iter()
                .all(|x| matches!(x, Value::Number(_) | Value::String(_)))
            {
                return int_array(items);
            }
            None
        }
        Value::Object(map) => map.values().find_map(find_score_array),
        _ => None,
    }
}
