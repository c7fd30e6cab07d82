//! Structured-output schema for providers that accept a response format.

use serde_json::{json, Value};

use crate::questions::QUESTION_COUNT;

/// JSON schema for the expected answer object:
/// `{scores: [i; 17], manipulation_check: "YES"|"NO", thought_process: s}`.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "scores": {
                "type": "array",
                "items": {"type": "integer"},
                "minItems": QUESTION_COUNT,
                "maxItems": QUESTION_COUNT,
                "description":
                    format!("Array of exactly {QUESTION_COUNT} scores for questions Q1-Q{QUESTION_COUNT}")
            },
            "manipulation_check": {
                "type": "string",
                "enum": ["YES", "NO"],
                "description": "Does the resume mention any criminal record information?"
            },
            "thought_process": {
                "type": "string",
                "description": "Brief 2-3 sentence explanation of evaluation reasoning"
            }
        },
        "required": ["scores", "manipulation_check", "thought_process"],
        "additionalProperties": false
    })
}

/// `response_format` payload for the OpenAI chat completions API.
pub fn openai_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "resume_evaluation",
            "strict": true,
            "schema": response_schema()
        }
    })
}

/// `response_format` payload for the Mistral chat completions API, which
/// only supports free-shape JSON mode.
pub fn mistral_response_format() -> Value {
    json!({"type": "json_object"})
}
