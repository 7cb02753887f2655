//! # Ledgerbench - Tool-calling consistency experiments for LLM agents
//!
//! Ledgerbench runs a fixed matrix of banking prompts against a local model,
//! exposes account operations through interchangeable tool facades, and scores
//! every trial against an expected operation sequence:
//! - Deterministic failure scenarios (per target, after a threshold, per pair)
//! - A per-trial call journal shared by every facade
//! - Greedy sequence evaluation with disjunctions and wildcards
//! - Model fallback with bounded retries and a per-invocation deadline
//! - Per-combination aggregation and a post-hoc problem-case analysis
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ledgerbench_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = LedgerbenchConfig::load()?;
//!     let agent = Arc::new(OllamaAgent::new(config.backend.clone())?);
//!
//!     let runner = ExperimentRunner::new(config, agent);
//!     runner.check_backend().await?;
//!
//!     let report = runner.run(&ResumePoint::from_start()).await?;
//!     println!("{}", report.render_summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **scenario**: decides whether each operation call succeeds
//! - **journal**: records every call in order for one trial
//! - **tools**: named-operation and single-dispatch facades over the journal
//! - **eval**: canonical operation strings and pattern matching
//! - **llm**: the agent boundary, Ollama provider and fallback policy
//! - **runner**: trial and experiment orchestration plus result files
//! - **report**: final report and results analysis
//!
//! ## Feature Flags
//!
//! - `llm-ollama` (default): Ollama chat provider over HTTP

pub mod config;
pub mod error;
pub mod eval;
pub mod journal;
pub mod llm;
pub mod metrics;
pub mod operation;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod tools;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        AgentConfig, BackendConfig, ExperimentTables, LedgerbenchConfig, PromptDefinition,
        RunConfig, ScenarioDefinition, ToolConfiguration,
    };
    pub use crate::error::{LedgerbenchError, Result};
    pub use crate::eval::{
        evaluate, AcceptanceTable, EvaluationResult, ExpectedPattern, PatternElement,
    };
    pub use crate::journal::{CallJournal, Event, EventParams, JournalFormat, ToolClass};
    pub use crate::llm::{Agent, AgentError, FallbackPolicy};
    #[cfg(feature = "llm-ollama")]
    pub use crate::llm::OllamaAgent;
    pub use crate::metrics::{aggregate, AggregatedMetrics};
    pub use crate::operation::OperationType;
    pub use crate::report::{analyze, Analysis, ExperimentReport};
    pub use crate::runner::{
        ExperimentRunner, ResultsStore, ResumePoint, TrialPlan, TrialRunner, TrialSummary,
    };
    pub use crate::scenario::{ScenarioMachine, ScenarioRule};
    pub use crate::tools::{Toolbox, ToolFacade};
}
