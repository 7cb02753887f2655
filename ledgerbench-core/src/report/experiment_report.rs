//! Final experiment report

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::metrics::AggregatedMetrics;
use crate::runner::{AGGREGATED_PREFIX, REPORT_FILE};

/// Aggregated metrics keyed by combination id (`CONF1-P2-B`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentReport {
    combinations: BTreeMap<String, AggregatedMetrics>,
}

impl ExperimentReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, combination_id: impl Into<String>, metrics: AggregatedMetrics) {
        self.combinations.insert(combination_id.into(), metrics);
    }

    pub fn get(&self, combination_id: &str) -> Option<&AggregatedMetrics> {
        self.combinations.get(combination_id)
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AggregatedMetrics)> {
        self.combinations.iter()
    }

    /// Rebuild the report from the `aggregated-*.json` files in `dir`
    pub fn collect(dir: impl AsRef<Path>) -> Result<Self> {
        let mut report = Self::new();

        for entry in fs::read_dir(dir.as_ref())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(combination) = name
                .strip_prefix(AGGREGATED_PREFIX)
                .and_then(|rest| rest.strip_suffix(".json"))
            else {
                continue;
            };

            let content = fs::read_to_string(entry.path())?;
            let metrics: AggregatedMetrics = serde_json::from_str(&content)?;
            report.insert(combination, metrics);
        }

        Ok(report)
    }

    /// Write `final-experiment-report.json` into `dir`
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(dir.as_ref())?;
        let path = dir.as_ref().join(REPORT_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Per-combination correctness, consistency and tool usage
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== EXPERIMENT SUMMARY ===");
        for (combination, metrics) in &self.combinations {
            let _ = writeln!(out, "Config: {}", combination);
            let _ = writeln!(out, "  Correctness: {:.2}%", metrics.correctness_percent());
            let _ = writeln!(out, "  Consistent: {}", metrics.consistent);
            let _ = writeln!(out, "  Tool Usage: {}", format_usage(&metrics.tool_usage));
            let _ = writeln!(out);
        }
        out
    }
}

pub(crate) fn format_usage(usage: &BTreeMap<String, usize>) -> String {
    let entries: Vec<String> = usage.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{{{}}}", entries.join(", "))
}
