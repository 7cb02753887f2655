//! Scenario rules
//!
//! A rule is immutable configuration data describing when an operation fails.
//! The mutable side lives in [`super::ScenarioMachine`].

use crate::operation::OperationType;
use serde::{Deserialize, Serialize};

/// Deterministic success/failure rule for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioRule {
    /// Every call succeeds
    #[default]
    AlwaysSucceed,

    /// Calls of `operation` directed at `account` fail; everything else succeeds.
    /// Without an account, every call of `operation` fails.
    FailOnTarget {
        operation: OperationType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account: Option<String>,
    },

    /// Calls of `operation` succeed up to `threshold` attempts per account,
    /// then fail on every later attempt to that account.
    FailAfterThreshold {
        operation: OperationType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account: Option<String>,
        threshold: u32,
    },

    /// The first call of `operation` to either account of the pair fails,
    /// every later call to the pair succeeds.
    FirstOfPairFails {
        operation: OperationType,
        accounts: [String; 2],
    },
}

impl ScenarioRule {
    /// Build a target-failure rule for a specific account
    pub fn fail_on_target(operation: OperationType, account: impl Into<String>) -> Self {
        ScenarioRule::FailOnTarget {
            operation,
            account: Some(account.into()),
        }
    }

    /// Build a counting-failure rule for a specific account
    pub fn fail_after_threshold(
        operation: OperationType,
        account: impl Into<String>,
        threshold: u32,
    ) -> Self {
        ScenarioRule::FailAfterThreshold {
            operation,
            account: Some(account.into()),
            threshold,
        }
    }

    /// Build an alternating-failure rule over two accounts
    pub fn first_of_pair_fails(
        operation: OperationType,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        ScenarioRule::FirstOfPairFails {
            operation,
            accounts: [first.into(), second.into()],
        }
    }

    /// Short human-readable description, used in logs and listings
    pub fn describe(&self) -> String {
        match self {
            ScenarioRule::AlwaysSucceed => "every call succeeds".to_string(),
            ScenarioRule::FailOnTarget { operation, account } => match account {
                Some(account) => format!("{} on {} fails", operation, account),
                None => format!("every {} fails", operation),
            },
            ScenarioRule::FailAfterThreshold {
                operation,
                account,
                threshold,
            } => format!(
                "{} on {} fails after {} attempts",
                operation,
                account.as_deref().unwrap_or("any account"),
                threshold
            ),
            ScenarioRule::FirstOfPairFails {
                operation,
                accounts,
            } => format!(
                "first {} among {}/{} fails",
                operation, accounts[0], accounts[1]
            ),
        }
    }
}

/// `None` targets every account
pub(crate) fn targets(designated: Option<&str>, account: &str) -> bool {
    designated.is_none_or(|d| d == account)
}
