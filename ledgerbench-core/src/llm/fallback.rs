//! Model fallback for agent invocations
//!
//! Each model gets a fixed number of attempts, separated by a delay. When a
//! model runs out of attempts the next one is tried immediately; when the last
//! model fails the invocation is exhausted.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::AgentError;

/// Which models to try, and how often
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    /// Models in preference order
    pub models: Vec<String>,

    /// Attempts per model before moving on
    pub retries_per_model: u32,

    /// Wait between two attempts on the same model
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            models: vec![
                "mistral:latest".to_string(),
                "llama3.1:latest".to_string(),
                "llama3:latest".to_string(),
            ],
            retries_per_model: 2,
            retry_delay: Duration::from_secs(3),
        }
    }
}

impl FallbackPolicy {
    pub fn new(models: Vec<String>) -> Self {
        Self {
            models,
            ..Default::default()
        }
    }

    /// Builder: set attempts per model
    pub fn with_retries_per_model(mut self, retries: u32) -> Self {
        self.retries_per_model = retries;
        self
    }

    /// Builder: set delay between attempts on the same model
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Attempts per model, at least one
    pub fn attempts_per_model(&self) -> u32 {
        self.retries_per_model.max(1)
    }

    /// Upper bound on attempts for one invocation
    pub fn max_attempts(&self) -> u32 {
        self.attempts_per_model() * self.models.len() as u32
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackStep {
    /// Try `model` next, after waiting `delay` if set
    Retry {
        model: String,
        delay: Option<Duration>,
    },

    /// No model or retry left
    Exhausted,
}

/// Position of an invocation within its fallback policy
#[derive(Debug)]
pub struct FallbackState {
    policy: FallbackPolicy,
    model_index: usize,
    retry_index: u32,
    attempts: u32,
    last_error: Option<String>,
}

impl FallbackState {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self {
            policy,
            model_index: 0,
            retry_index: 0,
            attempts: 0,
            last_error: None,
        }
    }

    /// Model the next attempt should use, `None` once exhausted
    pub fn current_model(&self) -> Option<&str> {
        self.policy.models.get(self.model_index).map(String::as_str)
    }

    /// Retry index on the current model (0-indexed)
    pub fn retry_index(&self) -> u32 {
        self.retry_index
    }

    /// Failed attempts so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Record a failed attempt and advance
    pub fn record_failure(&mut self, error: impl Into<String>) -> FallbackStep {
        self.attempts += 1;
        self.last_error = Some(error.into());
        self.retry_index += 1;

        if self.retry_index < self.policy.attempts_per_model() {
            if let Some(model) = self.current_model() {
                return FallbackStep::Retry {
                    model: model.to_string(),
                    delay: Some(self.policy.retry_delay),
                };
            }
        }

        self.model_index += 1;
        self.retry_index = 0;
        match self.current_model() {
            Some(model) => FallbackStep::Retry {
                model: model.to_string(),
                delay: None,
            },
            None => FallbackStep::Exhausted,
        }
    }

    /// Terminal error for an exhausted invocation
    pub fn exhausted_error(&self) -> AgentError {
        AgentError::Exhausted {
            attempts: self.attempts,
            last_error: self
                .last_error
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Successful invocation and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation<T> {
    pub value: T,

    /// Model that produced the value
    pub model: String,

    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Run `operation` with each model of the policy until one succeeds.
///
/// The caller bounds the whole call with its own deadline; dropping the
/// returned future cancels the attempt in flight.
pub async fn invoke_with_fallback<T, F, Fut>(
    policy: &FallbackPolicy,
    mut operation: F,
) -> Result<Invocation<T>, AgentError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
{
    let mut state = FallbackState::new(policy.clone());
    let mut model = match state.current_model() {
        Some(model) => model.to_string(),
        None => {
            return Err(AgentError::Exhausted {
                attempts: 0,
                last_error: "No models configured".to_string(),
            })
        }
    };

    loop {
        let attempt = state.attempts() + 1;
        debug!(model = %model, attempt, "Invoking agent");

        match operation(model.clone()).await {
            Ok(value) => {
                info!(model = %model, attempt, "Agent response received");
                return Ok(Invocation {
                    value,
                    model,
                    attempts: attempt,
                });
            }
            Err(e) => {
                warn!(model = %model, attempt, error = %e, "Agent attempt failed");
                match state.record_failure(e.to_string()) {
                    FallbackStep::Retry { model: next, delay } => {
                        match delay {
                            Some(delay) => tokio::time::sleep(delay).await,
                            None => info!(from = %model, to = %next, "Switching to next model"),
                        }
                        model = next;
                    }
                    FallbackStep::Exhausted => return Err(state.exhausted_error()),
                }
            }
        }
    }
}
