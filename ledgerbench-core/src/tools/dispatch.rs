//! Single-dispatch facade: one tool taking the operation type

use super::facade::{account_value_properties, ToolCallError, ToolDefinition, ToolFacade, TrialContext};
use crate::journal::{EventParams, ToolClass};
use crate::operation::OperationType;
use serde::Deserialize;
use serde_json::Value;

/// Name of the single dispatch tool
pub const DISPATCH_TOOL_NAME: &str = "executeOperation";

#[derive(Debug, Deserialize)]
struct DispatchArgs {
    #[serde(rename = "type", alias = "operationType")]
    operation: String,
    #[serde(rename = "accountNumber", alias = "account")]
    account_number: String,
    value: f64,
}

/// Exposes a single `executeOperation(type, accountNumber, value)` tool
#[derive(Debug, Clone)]
pub struct DispatchTools {
    ctx: TrialContext,
}

impl DispatchTools {
    pub fn new(ctx: TrialContext) -> Self {
        Self { ctx }
    }

    /// Execute an operation of the given type
    pub fn execute_operation(&self, operation: OperationType, account: &str, value: f64) -> bool {
        self.ctx.perform(
            ToolClass::SingleDispatch,
            DISPATCH_TOOL_NAME,
            operation,
            EventParams::dispatch(operation, account, value),
        )
    }
}

impl ToolFacade for DispatchTools {
    fn class(&self) -> ToolClass {
        ToolClass::SingleDispatch
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        let mut properties = account_value_properties();
        properties.insert(
            "type".to_string(),
            serde_json::json!({
                "type": "string",
                "enum": OperationType::ALL.iter().map(|op| op.as_str()).collect::<Vec<_>>(),
                "description": "WITHDRAW to take money out of the account, DEPOSIT to put money into it, \
                                TAX to charge a tax, RETURN to give back the value of a failed operation, \
                                PAYMENT to pay a value using the account"
            }),
        );

        vec![ToolDefinition::new(
            DISPATCH_TOOL_NAME,
            "Execute an operation in an account with a given value and return if the operation was successful or not",
            serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": ["type", "accountNumber", "value"]
            }),
        )]
    }

    fn handles(&self, name: &str) -> bool {
        name == DISPATCH_TOOL_NAME
    }

    fn invoke(&self, name: &str, args: &Value) -> Result<bool, ToolCallError> {
        if name != DISPATCH_TOOL_NAME {
            return Err(ToolCallError::UnknownTool(name.to_string()));
        }
        let args = DispatchArgs::deserialize(args).map_err(|e| ToolCallError::invalid(name, e))?;
        let operation: OperationType = args
            .operation
            .parse()
            .map_err(|e: String| ToolCallError::invalid(name, e))?;
        Ok(self.execute_operation(operation, &args.account_number, args.value))
    }
}
