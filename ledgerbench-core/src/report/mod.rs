//! Post-hoc analysis of a results directory
//!
//! [`ExperimentReport`] rebuilds the per-combination metrics from the
//! `aggregated-*.json` artifacts; [`analyze`] adds the results table and a
//! look at the individual runs of problematic combinations.

mod analysis;
mod experiment_report;

pub use analysis::{analyze, Analysis, AnalysisRow, IncorrectRun, ProblemCase};
pub use experiment_report::ExperimentReport;

#[cfg(test)]
mod tests;
