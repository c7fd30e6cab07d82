//! Best-effort parsing of heterogeneous model output.
//!
//! Models answer the questionnaire in several shapes: strict JSON (flat or
//! nested), JSON wrapped in markdown fences, or free-form numbered text.
//! Each extractor here is an ordered strategy chain — the first strategy that
//! succeeds wins, and the chains for scores, manipulation check, and thought
//! process run independently of each other.

mod manipulation;
mod scores;
mod thought;

pub use manipulation::{parse_manipulation_check, ManipulationCheck};
pub use scores::parse_scores;
pub use thought::parse_thought_process;

use serde_json::Value;

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Attempts to interpret the response as JSON, tolerating code fences.
fn decode_json(raw: &str) -> Option<Value> {
    serde_json::from_str(strip_json_fences(raw)).ok()
}

/// Coerces a JSON leaf to an integer: numbers directly (floats only when
/// whole), strings via parsing.
fn int_from(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"scores\": []}\n```";
        assert_eq!(strip_json_fences(input), "{\"scores\": []}");
    }

    #[test]
    fn test_strip_json_fences_plain() {
        assert_eq!(strip_json_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_decode_json_fenced() {
        let value = decode_json("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_int_from_coercions() {
        assert_eq!(int_from(&Value::from(4)), Some(4));
        assert_eq!(int_from(&Value::from(4.0)), Some(4));
        assert_eq!(int_from(&Value::from(4.5)), None);
        assert_eq!(int_from(&Value::from(" 3 ")), Some(3));
        assert_eq!(int_from(&Value::from("three")), None);
        assert_eq!(int_from(&Value::Null), None);
    }
}
