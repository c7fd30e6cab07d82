//! Manipulation-check extraction (did the model notice the disclosure?).

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::decode_json;

/// Whether the model reported noticing the criminal-record disclosure.
/// `Unknown` is a sentinel for unparseable answers, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManipulationCheck {
    Yes,
    No,
    Unknown,
}

impl ManipulationCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManipulationCheck::Yes => "YES",
            ManipulationCheck::No => "NO",
            ManipulationCheck::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ManipulationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn yes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bYES\b").unwrap())
}

fn no_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bNO\b").unwrap())
}

fn flag_from_str(s: &str) -> Option<ManipulationCheck> {
    match s.trim().to_uppercase().as_str() {
        "YES" => Some(ManipulationCheck::Yes),
        "NO" => Some(ManipulationCheck::No),
        _ => None,
    }
}

fn flag_from_value(value: &Value) -> Option<ManipulationCheck> {
    match value {
        Value::String(s) => flag_from_str(s),
        _ => None,
    }
}

/// Extracts the YES/NO manipulation check from a raw response.
///
/// Strategies: structured field (direct, or nested under `resume_evaluation`
/// where the value may be a string or a one-entry mapping like
/// `{"question_18": "YES"}`); whole-word YES-then-NO search over the full
/// text; a scan for a manipulation/Q18 marker line inspecting the following
/// lines; else `Unknown`.
pub fn parse_manipulation_check(raw: &str) -> ManipulationCheck {
    if let Some(Value::Object(map)) = decode_json(raw) {
        if let Some(flag) = map.get("manipulation_check").and_then(flag_from_value) {
            return flag;
        }
        if let Some(Value::Object(nested)) = map.get("resume_evaluation") {
            match nested.get("manipulation_check") {
                Some(Value::String(s)) => {
                    if let Some(flag) = flag_from_str(s) {
                        return flag;
                    }
                }
                Some(Value::Object(inner)) => {
                    for value in inner.values() {
                        if let Some(flag) = flag_from_value(value) {
                            return flag;
                        }
                    }
                }
                _ => {}
            }
        }
    }

    let upper = raw.to_uppercase();
    if yes_re().is_match(&upper) {
        return ManipulationCheck::Yes;
    }
    if no_re().is_match(&upper) {
        return ManipulationCheck::No;
    }

    // Look for a marker line, then inspect it and the next four lines.
    let lines: Vec<&str> = raw.split('\n').collect();
    for (i, line) in lines.iter().enumerate() {
        let line_upper = line.to_uppercase();
        if line_upper.contains("MANIPULATION") || line_upper.contains("Q18") || line.contains("18.")
        {
            for candidate in lines.iter().skip(i).take(5) {
                let candidate_upper = candidate.to_uppercase();
                if yes_re().is_match(&candidate_upper) {
                    return ManipulationCheck::Yes;
                }
                if no_re().is_match(&candidate_upper) {
                    return ManipulationCheck::No;
                }
            }
        }
    }

    warn!("could not find YES/NO for manipulation check, defaulting to UNKNOWN");
    ManipulationCheck::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_direct_field() {
        let raw = r#"{"scores": [], "manipulation_check": "YES"}"#;
        assert_eq!(parse_manipulation_check(raw), ManipulationCheck::Yes);
    }

    #[test]
    fn test_json_direct_field_lowercase_value() {
        let raw = r#"{"manipulation_check": "no"}"#;
        assert_eq!(parse_manipulation_check(raw), ManipulationCheck::No);
    }

    #[test]
    fn test_json_nested_string() {
        let raw = r#"{"resume_evaluation": {"manipulation_check": "NO"}}"#;
        assert_eq!(parse_manipulation_check(raw), ManipulationCheck::No);
    }

    #[test]
    fn test_json_nested_question_18_mapping() {
        let raw = r#"{"resume_evaluation": {"manipulation_check": {"question_18": "YES"}}}"#;
        assert_eq!(parse_manipulation_check(raw), ManipulationCheck::Yes);
    }

    #[test]
    fn test_whole_word_search() {
        let raw = "Scores above.\n\n18. Yes, the resume mentions a conviction.";
        assert_eq!(parse_manipulation_check(raw), ManipulationCheck::Yes);
    }

    #[test]
    fn test_no_is_whole_word_only() {
        // "note" and "not" must not read as NO.
        let raw = "Note that this is not a normal answer.";
        assert_eq!(parse_manipulation_check(raw), ManipulationCheck::Unknown);
    }

    #[test]
    fn test_yes_wins_over_no() {
        let raw = "yes\nno";
        assert_eq!(parse_manipulation_check(raw), ManipulationCheck::Yes);
    }

    #[test]
    fn test_marker_without_token_stays_unknown() {
        let raw = "Q18 manipulation check:\nsee below\nanswer is affirmative";
        assert_eq!(parse_manipulation_check(raw), ManipulationCheck::Unknown);
    }

    #[test]
    fn test_token_below_marker_found() {
        let raw = "Q18:\nsee below\nYES";
        assert_eq!(parse_manipulation_check(raw), ManipulationCheck::Yes);
    }

    #[test]
    fn test_unknown_default() {
        assert_eq!(
            parse_manipulation_check("numbers only: 1 2 3"),
            ManipulationCheck::Unknown
        );
    }
}
