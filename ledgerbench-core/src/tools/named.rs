//! Named-operation facade: one tool per operation kind

use super::facade::{account_value_properties, ToolCallError, ToolDefinition, ToolFacade, TrialContext};
use crate::journal::{EventParams, ToolClass};
use crate::operation::OperationType;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct AccountValueArgs {
    #[serde(rename = "accountNumber", alias = "account")]
    account_number: String,
    value: f64,
}

/// Exposes `withdraw`, `deposit`, `payment`, `taxes` and `returnValue`,
/// each taking an account number and a value.
#[derive(Debug, Clone)]
pub struct NamedOperationTools {
    ctx: TrialContext,
}

impl NamedOperationTools {
    pub fn new(ctx: TrialContext) -> Self {
        Self { ctx }
    }

    pub fn withdraw(&self, account: &str, value: f64) -> bool {
        self.perform(OperationType::Withdraw, account, value)
    }

    pub fn deposit(&self, account: &str, value: f64) -> bool {
        self.perform(OperationType::Deposit, account, value)
    }

    pub fn payment(&self, account: &str, value: f64) -> bool {
        self.perform(OperationType::Payment, account, value)
    }

    pub fn taxes(&self, account: &str, value: f64) -> bool {
        self.perform(OperationType::Tax, account, value)
    }

    pub fn return_value(&self, account: &str, value: f64) -> bool {
        self.perform(OperationType::Return, account, value)
    }

    fn perform(&self, operation: OperationType, account: &str, value: f64) -> bool {
        self.ctx.perform(
            ToolClass::NamedOperations,
            operation.method_name(),
            operation,
            EventParams::named(account, value),
        )
    }
}

fn description(operation: OperationType) -> &'static str {
    match operation {
        OperationType::Withdraw => {
            "Withdraw a value from an account and return if the operation was successful or not"
        }
        OperationType::Deposit => {
            "Deposit the value into an account and return if the operation was successful or not"
        }
        OperationType::Payment => {
            "Perform a payment with a value using the money from an account and return if the operation was successful or not"
        }
        OperationType::Tax => {
            "Charge the value of a tax from the account and return if the operation was successful or not"
        }
        OperationType::Return => {
            "Return a value of a failed operation to an account and return if the operation was successful or not"
        }
    }
}

impl ToolFacade for NamedOperationTools {
    fn class(&self) -> ToolClass {
        ToolClass::NamedOperations
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        [
            OperationType::Withdraw,
            OperationType::Deposit,
            OperationType::Payment,
            OperationType::Tax,
            OperationType::Return,
        ]
        .into_iter()
        .map(|op| {
            ToolDefinition::new(
                op.method_name(),
                description(op),
                serde_json::json!({
                    "type": "object",
                    "properties": account_value_properties(),
                    "required": ["accountNumber", "value"]
                }),
            )
        })
        .collect()
    }

    fn handles(&self, name: &str) -> bool {
        OperationType::from_method_name(name).is_some()
    }

    fn invoke(&self, name: &str, args: &Value) -> Result<bool, ToolCallError> {
        let operation = OperationType::from_method_name(name)
            .ok_or_else(|| ToolCallError::UnknownTool(name.to_string()))?;
        let args = AccountValueArgs::deserialize(args).map_err(|e| ToolCallError::invalid(name, e))?;
        Ok(self.perform(operation, &args.account_number, args.value))
    }
}
