//! Experiment orchestration over every combination

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{ExperimentTables, LedgerbenchConfig};
use crate::error::{LedgerbenchError, Result};
use crate::llm::Agent;
use crate::metrics::aggregate;
use crate::report::ExperimentReport;

use super::persist::ResultsStore;
use super::trial::{TrialPlan, TrialRunner};

/// Where to resume an interrupted experiment.
///
/// Combinations are skipped until the first one matching every given field;
/// everything from there on runs. Ids compare case-insensitively, and a
/// scenario may be given by suffix (`B`) or full id (`P2B`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumePoint {
    pub config: Option<String>,
    pub prompt: Option<String>,
    pub scenario: Option<String>,
}

impl ResumePoint {
    /// Run everything
    pub fn from_start() -> Self {
        Self::default()
    }

    pub fn is_from_start(&self) -> bool {
        self.config.is_none() && self.prompt.is_none() && self.scenario.is_none()
    }

    /// Whether a combination satisfies every given field
    pub fn matches(&self, plan: &TrialPlan<'_>) -> bool {
        let field = |wanted: &Option<String>, actual: &str| {
            wanted
                .as_deref()
                .is_none_or(|w| w.eq_ignore_ascii_case(actual))
        };
        field(&self.config, &plan.configuration.id)
            && field(&self.prompt, &plan.prompt.id)
            && (field(&self.scenario, &plan.scenario.suffix)
                || field(&self.scenario, &plan.scenario_id()))
    }

    /// Reject ids that do not exist in the tables
    pub fn validate(&self, tables: &ExperimentTables) -> Result<()> {
        if let Some(config) = &self.config {
            if !tables
                .configurations
                .iter()
                .any(|c| c.id.eq_ignore_ascii_case(config))
            {
                return Err(LedgerbenchError::Configuration(format!(
                    "Unknown configuration: {}",
                    config
                )));
            }
        }
        if let Some(prompt) = &self.prompt {
            if !tables.prompts.iter().any(|p| p.id.eq_ignore_ascii_case(prompt)) {
                return Err(LedgerbenchError::Configuration(format!(
                    "Unknown prompt: {}",
                    prompt
                )));
            }
        }
        if let Some(scenario) = &self.scenario {
            if !tables
                .prompts
                .iter()
                .flat_map(|p| p.scenarios.iter().map(move |s| (p, s)))
                .any(|(p, s)| {
                    s.suffix.eq_ignore_ascii_case(scenario)
                        || p.scenario_id(s).eq_ignore_ascii_case(scenario)
                })
            {
                return Err(LedgerbenchError::Configuration(format!(
                    "Unknown scenario: {}",
                    scenario
                )));
            }
        }
        Ok(())
    }
}

/// Every combination in table order: configuration, then prompt, then scenario
pub fn plans(tables: &ExperimentTables) -> Vec<TrialPlan<'_>> {
    tables
        .configurations
        .iter()
        .flat_map(move |configuration| {
            tables.prompts.iter().flat_map(move |prompt| {
                prompt
                    .scenarios
                    .iter()
                    .map(move |scenario| TrialPlan::new(configuration, prompt, scenario))
            })
        })
        .collect()
}

/// Runs the whole experiment, one trial at a time
pub struct ExperimentRunner {
    config: LedgerbenchConfig,
    agent: Arc<dyn Agent>,
    trials: TrialRunner,
    store: ResultsStore,
}

impl ExperimentRunner {
    pub fn new(config: LedgerbenchConfig, agent: Arc<dyn Agent>) -> Self {
        let trials = TrialRunner::new(
            agent.clone(),
            config.agent.fallback_policy(),
            config.agent.invocation_timeout,
        );
        let store = ResultsStore::new(&config.run.results_dir)
            .with_journal_format(config.run.journal_format);

        Self {
            config,
            agent,
            trials,
            store,
        }
    }

    pub fn config(&self) -> &LedgerbenchConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultsStore {
        &self.store
    }

    /// Fail fast when the inference backend is unreachable
    pub async fn check_backend(&self) -> Result<()> {
        info!(provider = %self.agent.provider(), url = %self.config.backend.base_url, "Checking inference backend");
        self.agent
            .health_check()
            .await
            .map_err(|e| LedgerbenchError::BackendUnavailable {
                url: self.config.backend.base_url.clone(),
                reason: e.to_string(),
            })
    }

    /// Run every combination from `resume` on and assemble the report.
    ///
    /// Trials run strictly sequentially with the configured cooldown between
    /// them. A failed trial is recorded and the experiment continues.
    pub async fn run(&self, resume: &ResumePoint) -> Result<ExperimentReport> {
        let tables = &self.config.experiment;
        resume.validate(tables)?;

        let all = plans(tables);
        let start = all
            .iter()
            .position(|plan| resume.matches(plan))
            .ok_or_else(|| {
                LedgerbenchError::Configuration(format!(
                    "No combination matches resume point {:?}",
                    resume
                ))
            })?;
        if start > 0 {
            info!(skipped = start, "Resuming experiment");
        }

        self.store.save_acceptance(&tables.acceptance_table());

        let runs = self.config.run.runs_per_combination;
        let mut report = ExperimentReport::new();
        let mut first_trial = true;

        for plan in &all[start..] {
            let combination = plan.combination_id();
            info!(combination = %combination, runs, "Running combination");

            let mut summaries = Vec::with_capacity(runs);
            for run_index in 0..runs {
                if !first_trial && !self.config.run.cooldown.is_zero() {
                    tokio::time::sleep(self.config.run.cooldown).await;
                }
                first_trial = false;

                let trial = self.trials.execute(plan).await;
                self.store.save_journal(&trial.journal);
                self.store.save_summary(&trial.summary, run_index + 1);

                if !trial.summary.used_llm {
                    warn!(combination = %combination, run = run_index + 1, "Trial failed, continuing");
                }
                info!(
                    combination = %combination,
                    run = run_index + 1,
                    of = runs,
                    correct = trial.summary.evaluation.correct,
                    "Run completed"
                );
                summaries.push(trial.summary);
            }

            let metrics = aggregate(&summaries);
            info!(
                combination = %combination,
                correct = metrics.correct_runs,
                total = metrics.total_runs,
                consistent = metrics.consistent,
                "Combination aggregated"
            );
            self.store.save_aggregated(&combination, &metrics);
            report.insert(combination, metrics);
        }

        self.store.save_report(&report);
        info!(combinations = report.len(), "Experiment finished");
        Ok(report)
    }
}
