//! Results directory artifacts

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{LedgerbenchError, Result};
use crate::eval::AcceptanceTable;
use crate::journal::{CallJournal, JournalFormat};
use crate::metrics::AggregatedMetrics;
use crate::report::ExperimentReport;

use super::trial::TrialSummary;

pub const ACCEPTANCE_FILE: &str = "acceptance_criteria.txt";
pub const REPORT_FILE: &str = "final-experiment-report.json";
pub const AGGREGATED_PREFIX: &str = "aggregated-";
pub const SUMMARY_PREFIX: &str = "summary-";

/// Writes experiment artifacts into a results directory.
///
/// Write failures are logged and otherwise ignored, so a full disk or a
/// read-only directory never aborts an experiment.
#[derive(Debug, Clone)]
pub struct ResultsStore {
    dir: PathBuf,
    journal_format: JournalFormat,
}

impl ResultsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            journal_format: JournalFormat::default(),
        }
    }

    /// Builder: format of the per-trial journal files
    pub fn with_journal_format(mut self, format: JournalFormat) -> Self {
        self.journal_format = format;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `run-<runId>.<ext>`
    pub fn journal_path(&self, run_id: &str) -> PathBuf {
        self.dir
            .join(format!("run-{}.{}", run_id, self.journal_format.extension()))
    }

    /// `summary-<combination>-run<n>.json`, `n` starting at 1
    pub fn summary_path(&self, combination_id: &str, run_number: usize) -> PathBuf {
        self.dir.join(format!(
            "{}{}-run{}.json",
            SUMMARY_PREFIX, combination_id, run_number
        ))
    }

    /// `aggregated-<combination>.json`
    pub fn aggregated_path(&self, combination_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}.json", AGGREGATED_PREFIX, combination_id))
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    pub fn acceptance_path(&self) -> PathBuf {
        self.dir.join(ACCEPTANCE_FILE)
    }

    /// Write the acceptance listing
    pub fn save_acceptance(&self, table: &AcceptanceTable) -> bool {
        self.write(&self.acceptance_path(), || Ok(table.render()))
    }

    /// Write a trial journal
    pub fn save_journal(&self, journal: &CallJournal) -> bool {
        let path = self.journal_path(journal.run_id());
        self.write(&path, || journal.serialize(self.journal_format))
    }

    /// Write a trial summary
    pub fn save_summary(&self, summary: &TrialSummary, run_number: usize) -> bool {
        let path = self.summary_path(&summary.combination_id(), run_number);
        self.write_json(&path, summary)
    }

    /// Write the aggregated metrics of a combination
    pub fn save_aggregated(&self, combination_id: &str, metrics: &AggregatedMetrics) -> bool {
        self.write_json(&self.aggregated_path(combination_id), metrics)
    }

    /// Write the final report
    pub fn save_report(&self, report: &ExperimentReport) -> bool {
        self.write_json(&self.report_path(), report)
    }

    /// Read back the trial summaries of a combination, ordered by run number
    pub fn load_summaries(&self, combination_id: &str) -> Result<Vec<TrialSummary>> {
        let prefix = format!("{}{}-run", SUMMARY_PREFIX, combination_id);
        let mut numbered = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(number) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|n| n.parse::<usize>().ok())
            else {
                continue;
            };

            let content = fs::read_to_string(entry.path())?;
            numbered.push((number, serde_json::from_str::<TrialSummary>(&content)?));
        }

        numbered.sort_by_key(|(number, _)| *number);
        Ok(numbered.into_iter().map(|(_, summary)| summary).collect())
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> bool {
        self.write(path, || Ok(serde_json::to_string_pretty(value)?))
    }

    fn write<F>(&self, path: &Path, render: F) -> bool
    where
        F: FnOnce() -> Result<String>,
    {
        let result: Result<()> = fs::create_dir_all(&self.dir)
            .map_err(LedgerbenchError::from)
            .and_then(|_| render())
            .and_then(|content| fs::write(path, content).map_err(LedgerbenchError::from));

        match result {
            Ok(()) => {
                debug!(path = %path.display(), "Artifact written");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not write artifact");
                false
            }
        }
    }
}
