//! Per-trial scenario state machine

use super::rule::{targets, ScenarioRule};
use crate::operation::OperationType;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mutable state of one trial's scenario.
///
/// Only [`ScenarioMachine::decide`] mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioState {
    /// Matching attempts seen so far, keyed by account
    pub attempts: HashMap<String, u32>,

    /// Whether the first call among an alternating pair already failed
    pub pair_resolved: bool,
}

/// Deterministic oracle deciding whether each operation request succeeds.
///
/// One machine is created per trial and dropped with it. `decide` may be
/// called from several threads; the state sits behind a single mutex so each
/// decision observes and updates it atomically.
#[derive(Debug)]
pub struct ScenarioMachine {
    scenario_id: String,
    rule: ScenarioRule,
    state: Mutex<ScenarioState>,
}

impl ScenarioMachine {
    /// Create a machine for a scenario rule
    pub fn new(scenario_id: impl Into<String>, rule: ScenarioRule) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            rule,
            state: Mutex::new(ScenarioState::default()),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ScenarioState {
        self.lock().clone()
    }

    /// Decide whether an operation request succeeds.
    ///
    /// The outcome depends only on the rule and the calls already decided in
    /// this trial; `value` is informational.
    pub fn decide(&self, operation: OperationType, account: &str, value: f64) -> bool {
        let mut state = self.lock();

        let outcome = match &self.rule {
            ScenarioRule::AlwaysSucceed => true,

            ScenarioRule::FailOnTarget {
                operation: designated,
                account: target,
            } => !(operation == *designated && targets(target.as_deref(), account)),

            ScenarioRule::FailAfterThreshold {
                operation: designated,
                account: target,
                threshold,
            } => {
                if operation == *designated && targets(target.as_deref(), account) {
                    let attempts = state.attempts.entry(account.to_string()).or_insert(0);
                    *attempts += 1;
                    *attempts <= *threshold
                } else {
                    true
                }
            }

            ScenarioRule::FirstOfPairFails {
                operation: designated,
                accounts,
            } => {
                if operation == *designated && accounts.iter().any(|a| a == account) {
                    if state.pair_resolved {
                        true
                    } else {
                        state.pair_resolved = true;
                        false
                    }
                } else {
                    true
                }
            }
        };

        tracing::debug!(
            scenario = %self.scenario_id,
            operation = %operation,
            account = %account,
            value = value,
            outcome = outcome,
            "Scenario decision"
        );

        outcome
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScenarioState> {
        // A panic while holding the lock cannot leave the counters half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
