//! Journal event types

use crate::operation::OperationType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tool facade variant recorded an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ToolClass {
    /// One tool per operation (`withdraw`, `deposit`, ...)
    NamedOperations,

    /// A single `executeOperation` tool taking the operation type
    SingleDispatch,
}

impl ToolClass {
    /// Facade name used in tool-usage statistics
    pub fn name(&self) -> &'static str {
        match self {
            ToolClass::NamedOperations => "NamedOperations",
            ToolClass::SingleDispatch => "SingleDispatch",
        }
    }
}

impl fmt::Display for ToolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arguments of an operation call, in the order the agent supplied them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventParams {
    /// Operation type, only present for single-dispatch calls
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationType>,

    pub account: String,

    pub value: f64,
}

impl EventParams {
    /// Parameters of a named-operation call
    pub fn named(account: impl Into<String>, value: f64) -> Self {
        Self {
            operation: None,
            account: account.into(),
            value,
        }
    }

    /// Parameters of a single-dispatch call
    pub fn dispatch(operation: OperationType, account: impl Into<String>, value: f64) -> Self {
        Self {
            operation: Some(operation),
            account: account.into(),
            value,
        }
    }
}

/// One recorded operation call and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Trial identifier
    pub run_id: String,

    /// Position in the journal, starting at 1
    pub sequence: u64,

    /// When the call was recorded
    pub timestamp: DateTime<Utc>,

    /// Facade variant that received the call
    pub tool_class: ToolClass,

    /// Tool name as invoked by the agent
    pub method: String,

    /// Call arguments
    pub params: EventParams,

    /// Outcome returned to the agent
    pub result: bool,
}
