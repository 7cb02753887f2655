//! Scenario simulation
//!
//! Each trial gets a fresh [`ScenarioMachine`] built from a [`ScenarioRule`].
//! The machine is the only source of operation outcomes: it decides, call by
//! call, whether a withdraw/deposit/... succeeds, replaying a fixed
//! experimental condition. It never knows about balances or account validity.
//!
//! # Example
//!
//! ```rust
//! use ledgerbench_core::operation::OperationType;
//! use ledgerbench_core::scenario::{ScenarioMachine, ScenarioRule};
//!
//! let machine = ScenarioMachine::new(
//!     "P2B",
//!     ScenarioRule::fail_after_threshold(OperationType::Withdraw, "BC3456A", 3),
//! );
//!
//! let outcomes: Vec<bool> = (0..4)
//!     .map(|_| machine.decide(OperationType::Withdraw, "BC3456A", 500.0))
//!     .collect();
//! assert_eq!(outcomes, vec![true, true, true, false]);
//! ```

mod machine;
mod rule;

pub use machine::{ScenarioMachine, ScenarioState};
pub use rule::ScenarioRule;
