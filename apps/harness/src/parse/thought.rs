//! Thought-process (rationale) extraction.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::decode_json;

const MARKERS: [&str; 6] = [
    "19.",
    "q19",
    "thought process",
    "explain your thought",
    "step-by-step",
    "reasoning",
];

fn trailing_yes_no_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+(YES|NO)\s*$").unwrap())
}

fn section_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*---\s*\n|\n\s*\n\s*\n").unwrap())
}

/// Extracts the free-text rationale from a raw response.
///
/// Strategies: structured field (direct, or nested under `resume_evaluation`
/// as `thought_process` / `thought_process_analysis`, where the analysis may
/// be a string, a dict with `response`/`formatted` sub-fields, or an
/// arbitrarily nested structure with a `text` leaf); a marker line
/// (`19.`, `q19`, "thought process", ...) taking everything after it; the
/// last blank-line/`---` separated section longer than 100 characters.
/// Trailing stray YES/NO tokens are stripped. Returns an empty string when
/// nothing qualifies — never an error.
pub fn parse_thought_process(raw: &str) -> String {
    if let Some(Value::Object(map)) = decode_json(raw) {
        if let Some(value) = map.get("thought_process") {
            return leaf_string(value);
        }
        if let Some(Value::Object(nested)) = map.get("resume_evaluation") {
            if let Some(value) = nested.get("thought_process") {
                return leaf_string(value);
            }
            if let Some(analysis) = nested.get("thought_process_analysis") {
                match analysis {
                    Value::String(s) => return s.trim().to_string(),
                    Value::Object(inner) => {
                        if let Some(Value::String(s)) = inner.get("response") {
                            return s.trim().to_string();
                        }
                        if let Some(Value::String(s)) = inner.get("formatted") {
                            return s.trim().to_string();
                        }
                        if let Some(text) = extract_text(analysis) {
                            return text;
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    let lines: Vec<&str> = raw.split('\n').collect();
    let mut start_idx = None;
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if MARKERS.iter().any(|marker| lower.contains(marker)) {
            start_idx = Some(i + 1);
            break;
        }
    }

    if let Some(start) = start_idx {
        if start < lines.len() {
            let text = lines[start..].join("\n").trim().to_string();
            let text = trailing_yes_no_re().replace(&text, "").to_string();
            if !text.is_empty() {
                return text;
            }
        }
    }

    let sections: Vec<&str> = section_split_re().split(raw).collect();
    if sections.len() > 1 {
        for section in sections.iter().rev() {
            let section = section.trim();
            if section.chars().count() > 100 {
                return trailing_yes_no_re().replace(section, "").to_string();
            }
        }
    }

    warn!("could not extract thought process, returning empty string");
    String::new()
}

/// A direct structured field always wins, even when empty.
fn leaf_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Recursive search for a usable text leaf: `text` keys, `response` chains,
/// else the first non-empty string value.
fn extract_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Object(map) => {
            if let Some(text) = map.get("text") {
                let s = leaf_string(text);
                return (!s.is_empty()).then_some(s);
            }
            if let Some(response) = map.get("response") {
                return extract_text(response);
            }
            map.values().find_map(extract_text)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_direct_field() {
        let raw = r#"{"scores": [1], "thought_process": "  Solid work history.  "}"#;
        assert_eq!(parse_thought_process(raw), "Solid work history.");
    }

    #[test]
    fn test_json_direct_field_empty_wins() {
        let raw = r#"{"thought_process": ""}"#;
        assert_eq!(parse_thought_process(raw), "");
    }

    #[test]
    fn test_json_nested_thought_process() {
        let raw = r#"{"resume_evaluation": {"thought_process": "Balanced record."}}"#;
        assert_eq!(parse_thought_process(raw), "Balanced record.");
    }

    #[test]
    fn test_json_analysis_string() {
        let raw = r#"{"resume_evaluation": {"thought_process_analysis": "Weighed both sides."}}"#;
        assert_eq!(parse_thought_process(raw), "Weighed both sides.");
    }

    #[test]
    fn test_json_analysis_response_subfield() {
        let raw =
            r#"{"resume_evaluation": {"thought_process_analysis": {"response": "Via response."}}}"#;
        assert_eq!(parse_thought_process(raw), "Via response.");
    }

    #[test]
    fn test_json_analysis_formatted_subfield() {
        let raw = r#"{"resume_evaluation": {"thought_process_analysis": {"formatted": "Via formatted."}}}"#;
        assert_eq!(parse_thought_process(raw), "Via formatted.");
    }

    #[test]
    fn test_json_analysis_nested_text_leaf() {
        let raw = r#"{"resume_evaluation": {"thought_process_analysis": {"question_19": {"response": {"text": "Deep leaf."}}}}}"#;
        assert_eq!(parse_thought_process(raw), "Deep leaf.");
    }

    #[test]
    fn test_marker_line_takes_rest() {
        let raw = "1. 4\n2. 2\n19. Thought process:\nThe applicant shows steady employment.";
        assert_eq!(
            parse_thought_process(raw),
            "The applicant shows steady employment."
        );
    }

    #[test]
    fn test_marker_strips_trailing_yes() {
        let raw = "reasoning below\nSteady history, some risk.\nYES";
        assert_eq!(parse_thought_process(raw), "Steady history, some risk.");
    }

    #[test]
    fn test_section_fallback_takes_last_long_section() {
        let long = "The applicant demonstrates a consistent employment record and several \
                    certifications relevant to the role, which suggests reliability.";
        let raw = format!("1\n2\n3\n\n---\n\n{long}");
        assert_eq!(parse_thought_process(&raw), long);
    }

    #[test]
    fn test_section_fallback_skips_short_sections() {
        let long = "A much longer concluding paragraph that easily clears the one hundred \
                    character threshold used by the section fallback heuristic.";
        let raw = format!("{long}\n\n---\n\nshort tail");
        assert_eq!(parse_thought_process(&raw), long);
    }

    #[test]
    fn test_empty_when_nothing_qualifies() {
        assert_eq!(parse_thought_process("1\n2\n3"), "");
    }
}
