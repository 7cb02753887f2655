//! Error types for Ledgerbench operations

use crate::llm::AgentError;

/// Result type for Ledgerbench operations
pub type Result<T> = std::result::Result<T, LedgerbenchError>;

/// Error types for the evaluation engine and its runner
#[derive(Debug, thiserror::Error)]
pub enum LedgerbenchError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Agent invocation failed (terminal, after the fallback policy ran out)
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// Inference backend could not be reached at startup
    #[error("Inference backend unavailable at {url}: {reason}")]
    BackendUnavailable { url: String, reason: String },

    /// Artifact could not be written or read
    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for LedgerbenchError {
    fn from(s: String) -> Self {
        LedgerbenchError::Other(s)
    }
}

impl From<&str> for LedgerbenchError {
    fn from(s: &str) -> Self {
        LedgerbenchError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for LedgerbenchError {
    fn from(err: anyhow::Error) -> Self {
        LedgerbenchError::Other(err.to_string())
    }
}

impl From<figment::Error> for LedgerbenchError {
    fn from(err: figment::Error) -> Self {
        LedgerbenchError::Configuration(err.to_string())
    }
}
