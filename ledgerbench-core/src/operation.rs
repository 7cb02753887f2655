//! Operation kinds exposed to the agent

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of financial operations an agent may request.
///
/// None of them touches a real ledger: an operation only asks the scenario
/// whether it succeeds and is journaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Withdraw,
    Deposit,
    Tax,
    Return,
    Payment,
}

impl OperationType {
    /// All operation types, in the order the dispatch tool documents them
    pub const ALL: [OperationType; 5] = [
        OperationType::Withdraw,
        OperationType::Deposit,
        OperationType::Tax,
        OperationType::Return,
        OperationType::Payment,
    ];

    /// Wire name used by the single-dispatch tool (`WITHDRAW`, `TAX`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Withdraw => "WITHDRAW",
            OperationType::Deposit => "DEPOSIT",
            OperationType::Tax => "TAX",
            OperationType::Return => "RETURN",
            OperationType::Payment => "PAYMENT",
        }
    }

    /// Canonical method name, shared by the named-operation tools and the
    /// canonical operation strings the evaluator compares.
    pub fn method_name(&self) -> &'static str {
        match self {
            OperationType::Withdraw => "withdraw",
            OperationType::Deposit => "deposit",
            OperationType::Tax => "taxes",
            OperationType::Return => "returnValue",
            OperationType::Payment => "payment",
        }
    }

    /// Reverse of [`OperationType::method_name`]
    pub fn from_method_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.method_name() == name)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = String;

    /// Case-insensitive parse of the wire name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == upper)
            .ok_or_else(|| format!("Unknown operation type: {}", s))
    }
}
