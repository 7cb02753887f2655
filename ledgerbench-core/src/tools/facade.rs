//! Tool facade capability and shared call path

use crate::journal::{CallJournal, EventParams, ToolClass};
use crate::operation::OperationType;
use crate::scenario::ScenarioMachine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Description of one callable tool, as advertised to the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (unique within a toolbox)
    pub name: String,

    /// What the tool does, written for the model
    pub description: String,

    /// JSON Schema of the arguments object
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Reasons a tool call is rejected before reaching the scenario
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolCallError {
    /// No facade in the toolbox exposes this tool
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// Arguments do not have the expected shape
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

impl ToolCallError {
    pub(crate) fn invalid(tool: &str, reason: impl ToString) -> Self {
        ToolCallError::InvalidArguments {
            tool: tool.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// The capability every facade variant provides: it can be invoked by the
/// agent, reports the outcome, and journals the call.
pub trait ToolFacade: Send + Sync {
    /// Variant recorded on journal events
    fn class(&self) -> ToolClass;

    /// Tools this facade exposes
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Whether this facade exposes a tool with the given name
    fn handles(&self, name: &str) -> bool {
        self.definitions().iter().any(|d| d.name == name)
    }

    /// Execute a tool call with JSON arguments
    fn invoke(&self, name: &str, args: &Value) -> Result<bool, ToolCallError>;
}

/// Per-trial collaborators shared by every facade of a toolbox
#[derive(Debug, Clone)]
pub struct TrialContext {
    pub machine: Arc<ScenarioMachine>,
    pub journal: Arc<CallJournal>,
}

impl TrialContext {
    /// Bundle a scenario machine and a journal
    pub fn new(machine: Arc<ScenarioMachine>, journal: Arc<CallJournal>) -> Self {
        Self { machine, journal }
    }

    /// Ask the scenario for an outcome, journal the call, return the outcome
    pub(crate) fn perform(
        &self,
        class: ToolClass,
        method: &str,
        operation: OperationType,
        params: EventParams,
    ) -> bool {
        let outcome = self
            .machine
            .decide(operation, &params.account, params.value);
        let event = self.journal.append(class, method, params, outcome);

        tracing::debug!(
            run_id = %event.run_id,
            sequence = event.sequence,
            tool_class = %class,
            method = %method,
            result = outcome,
            "Operation recorded"
        );

        outcome
    }
}

/// JSON schema fragment shared by all operation tools
pub(crate) fn account_value_properties() -> serde_json::Map<String, Value> {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "accountNumber".to_string(),
        serde_json::json!({ "type": "string", "description": "account number" }),
    );
    properties.insert(
        "value".to_string(),
        serde_json::json!({ "type": "number", "description": "value used in the operation" }),
    );
    properties
}
