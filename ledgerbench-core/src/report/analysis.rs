//! Results table and problem-case analysis

use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use super::experiment_report::{format_usage, ExperimentReport};
use crate::config::ExperimentTables;
use crate::error::Result;
use crate::metrics::AggregatedMetrics;
use crate::runner::ResultsStore;

/// Incorrect runs shown per problematic combination
const MAX_INCORRECT_RUNS_SHOWN: usize = 3;

const RULE: &str = "================================================================================";
const THIN_RULE: &str = "--------------------------------------------------------------------------------";

/// One line of the results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub config: String,
    pub prompt: String,
    pub scenario: String,
    pub metrics: AggregatedMetrics,

    /// Facade the agent used
    pub approach: String,
}

impl AnalysisRow {
    pub fn combination_id(&self) -> String {
        format!("{}-{}-{}", self.config, self.prompt, self.scenario)
    }

    /// `correct/total (pct%)`
    pub fn correctness(&self) -> String {
        format!(
            "{}/{} ({:.1}%)",
            self.metrics.correct_runs,
            self.metrics.total_runs,
            self.metrics.correctness_percent()
        )
    }
}

/// A run that did not match its expected pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncorrectRun {
    pub run_id: String,
    pub mismatches: Vec<String>,
    pub observed_ops: Vec<String>,
}

/// Combination with failed or inconsistent runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemCase {
    pub row: AnalysisRow,

    /// Number of incorrect runs found on disk
    pub incorrect_count: usize,

    /// First few incorrect runs
    pub incorrect_runs: Vec<IncorrectRun>,
}

/// Results table plus problem cases
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub rows: Vec<AnalysisRow>,
    pub problems: Vec<ProblemCase>,
}

/// Split `CONF-PROMPT-SUFFIX`; the configuration id may itself contain dashes
fn split_combination(id: &str) -> (String, String, String) {
    let mut parts = id.rsplitn(3, '-');
    let scenario = parts.next().unwrap_or_default().to_string();
    let prompt = parts.next().unwrap_or_default().to_string();
    let config = parts.next().unwrap_or_default().to_string();
    (config, prompt, scenario)
}

fn approach(config: &str, metrics: &AggregatedMetrics, tables: &ExperimentTables) -> String {
    match tables.configuration(config).map(|c| c.facades.as_slice()) {
        Some([single]) => single.name().to_string(),
        _ => metrics
            .tool_usage
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("/"),
    }
}

/// Analyze the artifacts in `dir`
pub fn analyze(dir: impl AsRef<Path>, tables: &ExperimentTables) -> Result<Analysis> {
    let report = ExperimentReport::collect(dir.as_ref())?;
    let store = ResultsStore::new(dir.as_ref());

    let rows: Vec<AnalysisRow> = report
        .iter()
        .map(|(combination, metrics)| {
            let (config, prompt, scenario) = split_combination(combination);
            AnalysisRow {
                approach: approach(&config, metrics, tables),
                config,
                prompt,
                scenario,
                metrics: metrics.clone(),
            }
        })
        .collect();

    let mut problems = Vec::new();
    for row in rows.iter().filter(|r| r.metrics.is_problematic()) {
        let incorrect: Vec<IncorrectRun> = store
            .load_summaries(&row.combination_id())?
            .into_iter()
            .filter(|s| !s.evaluation.correct)
            .map(|s| IncorrectRun {
                run_id: s.run_id,
                mismatches: s.evaluation.mismatches,
                observed_ops: s.evaluation.observed_ops,
            })
            .collect();

        problems.push(ProblemCase {
            row: row.clone(),
            incorrect_count: incorrect.len(),
            incorrect_runs: incorrect.into_iter().take(MAX_INCORRECT_RUNS_SHOWN).collect(),
        });
    }

    Ok(Analysis { rows, problems })
}

impl Analysis {
    /// Human-readable table and problem-case section
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "EXPERIMENT RESULTS");
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out);
        let _ = writeln!(out, "RESULTS TABLE");
        let _ = writeln!(out, "{}", THIN_RULE);
        let _ = writeln!(
            out,
            "{:<8} {:<6} {:<8} {:<14} {:<10} {:<15}",
            "Config", "Prompt", "Scenario", "Correctness", "Consistent", "Approach"
        );
        let _ = writeln!(out, "{}", THIN_RULE);
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:<8} {:<6} {:<8} {:<14} {:<10} {:<15}",
                row.config,
                row.prompt,
                row.scenario,
                row.correctness(),
                if row.metrics.consistent { "yes" } else { "no" },
                row.approach
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "PROBLEM CASES");
        let _ = writeln!(out, "{}", RULE);

        if self.problems.is_empty() {
            let _ = writeln!(out, "No problem cases: every run was correct and consistent.");
            return out;
        }

        for case in &self.problems {
            let row = &case.row;
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", row.combination_id());
            let _ = writeln!(out, "   - Correctness: {}", row.correctness());
            let _ = writeln!(out, "   - Consistent: {}", row.metrics.consistent);
            let _ = writeln!(out, "   - Tools used: {}", format_usage(&row.metrics.tool_usage));
            if case.incorrect_count > 0 {
                let _ = writeln!(out, "   - Incorrect runs: {}", case.incorrect_count);
                for run in &case.incorrect_runs {
                    let short: String = run.run_id.chars().take(8).collect();
                    let _ = writeln!(out, "     * Run {}...:", short);
                    for mismatch in &run.mismatches {
                        let _ = writeln!(out, "       - {}", mismatch);
                    }
                    let _ = writeln!(out, "       Observed operations: {:?}", run.observed_ops);
                }
            }
        }
        out
    }
}
