//! Agent boundary
//!
//! The engine talks to the language model only through the [`Agent`] trait:
//! given a model name, a prompt and the trial's [`Toolbox`], the agent may call
//! tools any number of times and eventually answers with text. Which model
//! answers is decided by the [`FallbackPolicy`].

use async_trait::async_trait;
use std::time::Duration;

use crate::tools::Toolbox;

pub mod fallback;
pub mod providers;

pub use fallback::{invoke_with_fallback, FallbackPolicy, FallbackState, FallbackStep, Invocation};

#[cfg(feature = "llm-ollama")]
pub use providers::OllamaAgent;

/// Failures of a single agent invocation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    /// Backend could not be reached or the connection broke
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("Backend API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Backend answered with something we could not interpret
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Model kept requesting tools past the configured number of turns
    #[error("Tool-call turn limit reached after {0} turns")]
    TurnLimit(usize),

    /// Invocation deadline elapsed
    #[error("Model response timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Every model and retry failed
    #[error("All models and retries failed after {attempts} attempts. Last error: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// A tool-calling language model agent
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run one conversation with `model`, letting it call tools from
    /// `toolbox`, and return its final text answer
    async fn respond(
        &self,
        model: &str,
        prompt: &str,
        toolbox: &Toolbox,
    ) -> Result<String, AgentError>;

    /// Check that the inference backend is reachable
    async fn health_check(&self) -> Result<(), AgentError>;

    /// Provider name for logs
    fn provider(&self) -> &str;
}
