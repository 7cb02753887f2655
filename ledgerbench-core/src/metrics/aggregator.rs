//! Aggregation of repeated trials

use crate::runner::TrialSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tool-usage marker for a trial whose journal is empty
pub const NO_TOOLS_USED: &str = "NO_TOOLS_USED";

/// Summary statistics of one (configuration, prompt, scenario) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub total_runs: usize,
    pub correct_runs: usize,

    /// `correct_runs / total_runs`, 0.0 with no trials
    pub correctness_ratio: f64,

    /// Every trial produced a structurally equal evaluation
    pub consistent: bool,

    /// Facade name to the number of trials that used it
    pub tool_usage: BTreeMap<String, usize>,
}

impl AggregatedMetrics {
    /// Correctness as a percentage
    pub fn correctness_percent(&self) -> f64 {
        self.correctness_ratio * 100.0
    }

    /// Whether the combination needs a closer look in the analysis
    pub fn is_problematic(&self) -> bool {
        self.correctness_ratio < 1.0 || !self.consistent
    }
}

/// Combine the summaries of repeated trials.
///
/// Each trial counts a facade name at most once; a trial that recorded no
/// calls counts [`NO_TOOLS_USED`].
pub fn aggregate(trials: &[TrialSummary]) -> AggregatedMetrics {
    let total_runs = trials.len();
    let correct_runs = trials.iter().filter(|t| t.evaluation.correct).count();

    let correctness_ratio = if total_runs == 0 {
        0.0
    } else {
        correct_runs as f64 / total_runs as f64
    };

    let consistent = match trials.split_first() {
        Some((first, rest)) => rest.iter().all(|t| t.evaluation == first.evaluation),
        None => false,
    };

    let mut tool_usage: BTreeMap<String, usize> = BTreeMap::new();
    for trial in trials {
        if trial.events.is_empty() {
            *tool_usage.entry(NO_TOOLS_USED.to_string()).or_default() += 1;
            continue;
        }

        let mut seen: Vec<&str> = Vec::new();
        for event in &trial.events {
            let name = event.tool_class.name();
            if !seen.contains(&name) {
                seen.push(name);
                *tool_usage.entry(name.to_string()).or_default() += 1;
            }
        }
    }

    AggregatedMetrics {
        total_runs,
        correct_runs,
        correctness_ratio,
        consistent,
        tool_usage,
    }
}
