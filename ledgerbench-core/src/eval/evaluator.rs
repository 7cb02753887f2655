//! Greedy sequence matching of observed operations against a pattern

use super::canonical::{canonicalize, normalize};
use super::pattern::ExpectedPattern;
use crate::journal::Event;
use serde::{Deserialize, Serialize};

/// Outcome of comparing one trial's journal with its expected pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// No expected element went unmatched
    pub correct: bool,

    /// One `Expected not found: ...` entry per unmatched element
    pub mismatches: Vec<String>,

    /// Canonical operation strings in journal order
    pub observed_ops: Vec<String>,

    pub expected_count: usize,
    pub observed_count: usize,

    /// Fraction of positions where expected and observed agree
    pub sequence_accuracy: f64,
}

/// Compare observed events against an expected pattern.
///
/// Each element is looked up from a single forward cursor. A match moves the
/// cursor just past the matched operation; a miss records a mismatch and
/// leaves the cursor where it was, so later elements may still match.
/// Extra observed operations are not penalized.
pub fn evaluate(events: &[Event], expected: &ExpectedPattern) -> EvaluationResult {
    let observed_ops: Vec<String> = events.iter().map(canonicalize).collect();

    let mut mismatches = Vec::new();
    let mut cursor = 0usize;
    for element in expected {
        let found = observed_ops[cursor..]
            .iter()
            .position(|op| element.matches(op));
        match found {
            Some(offset) => cursor += offset + 1,
            None => mismatches.push(format!("Expected not found: {}", element)),
        }
    }

    let expected_count = expected.len();
    let observed_count = observed_ops.len();
    let sequence_accuracy = sequence_accuracy(expected, &observed_ops);

    EvaluationResult {
        correct: mismatches.is_empty(),
        mismatches,
        observed_ops,
        expected_count,
        observed_count,
        sequence_accuracy,
    }
}

fn sequence_accuracy(expected: &ExpectedPattern, observed: &[String]) -> f64 {
    if expected.is_empty() || observed.is_empty() {
        return 0.0;
    }

    let compared = expected.len().min(observed.len());
    let agreeing = expected
        .iter()
        .zip(observed)
        .filter(|(element, op)| normalize(&element.to_string()) == normalize(op))
        .count();

    agreeing as f64 / compared as f64
}
