//! The fixed questionnaire: 17 ordinal items and their legal answer ranges.

use crate::errors::EvalError;

/// Number of numeric questionnaire items. Q18 (manipulation check) and Q19
/// (thought process) are free-form follow-ups handled by the parser.
pub const QUESTION_COUNT: usize = 17;

/// Inclusive legal range per question, indexed by question number minus one.
///
/// Q1 is the 7-point callback likelihood scale; Q2-Q6 are 5-point accuracy
/// scales; Q7-Q16 are 6-point agreement/support scales; Q17 is a binary
/// policy choice.
pub const QUESTION_RANGES: [(i64, i64); QUESTION_COUNT] = [
    (1, 7), // Q1
    (1, 5), // Q2
    (1, 5), // Q3
    (1, 5), // Q4
    (1, 5), // Q5
    (1, 5), // Q6
    (1, 6), // Q7
    (1, 6), // Q8
    (1, 6), // Q9
    (1, 6), // Q10
    (1, 6), // Q11
    (1, 6), // Q12
    (1, 6), // Q13
    (1, 6), // Q14
    (1, 6), // Q15
    (1, 6), // Q16
    (1, 2), // Q17
];

/// Checks a parsed score vector against the per-question ranges and returns
/// it unchanged on success.
///
/// Fails when the vector length differs from [`QUESTION_COUNT`] or any
/// element falls outside its question's inclusive range; the error names the
/// 1-based question index, the observed value, and the legal bounds.
pub fn validate_scores(scores: Vec<i64>) -> Result<Vec<i64>, EvalError> {
    if scores.len() != QUESTION_COUNT {
        return Err(EvalError::ScoreCount {
            expected: QUESTION_COUNT,
            got: scores.len(),
        });
    }

    for (i, (&score, &(min, max))) in scores.iter().zip(QUESTION_RANGES.iter()).enumerate() {
        if score < min || score > max {
            return Err(EvalError::ScoreRange {
                question: i + 1,
                value: score,
                min,
                max,
            });
        }
    }

    Ok(scores)
}
