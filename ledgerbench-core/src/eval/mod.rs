//! Trial evaluation
//!
//! Turns a trial's journal into canonical operation strings and compares them
//! with the expected pattern of its (prompt, scenario) pair.
//!
//! # Example
//!
//! ```rust
//! use ledgerbench_core::eval::{evaluate, ExpectedPattern};
//! use ledgerbench_core::journal::{CallJournal, EventParams, ToolClass};
//!
//! let journal = CallJournal::new("run-1");
//! journal.append(ToolClass::NamedOperations, "withdraw", EventParams::named("BC12345", 1000.0), true);
//!
//! let expected = ExpectedPattern::parse(["withdraw(BC12345,1000.0)"]).unwrap();
//! let result = evaluate(&journal.export_events(), &expected);
//! assert!(result.correct);
//! assert_eq!(result.sequence_accuracy, 1.0);
//! ```

mod acceptance;
mod canonical;
mod evaluator;
mod pattern;

pub use acceptance::{AcceptanceTable, ACCEPTANCE_HEADER};
pub use canonical::{canonical_method, canonicalize, format_value, normalize, FAILED_SUFFIX};
pub use evaluator::{evaluate, EvaluationResult};
pub use pattern::{ExpectedPattern, PatternElement, DISJUNCTION_SEPARATOR};
