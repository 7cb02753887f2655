//! Trial and experiment orchestration
//!
//! A trial runs one prompt against one tool configuration under one scenario.
//! The [`ExperimentRunner`] repeats trials for every combination of the
//! experiment tables, aggregates them, and writes artifacts through the
//! [`ResultsStore`].

mod experiment;
mod persist;
mod trial;

pub use experiment::{plans, ExperimentRunner, ResumePoint};
pub use persist::{
    ResultsStore, ACCEPTANCE_FILE, AGGREGATED_PREFIX, REPORT_FILE, SUMMARY_PREFIX,
};
pub use trial::{CompletedTrial, TrialPlan, TrialRunner, TrialSummary, ERROR_RESPONSE_PREFIX};

#[cfg(test)]
mod tests;
