//! Operation tool facades
//!
//! The agent never sees the scenario or the journal directly: it calls tools.
//! Two facade variants expose the same five operations with different calling
//! conventions:
//!
//! - [`NamedOperationTools`]: `withdraw`, `deposit`, `payment`, `taxes`,
//!   `returnValue`, each `(accountNumber, value) -> bool`
//! - [`DispatchTools`]: `executeOperation(type, accountNumber, value) -> bool`
//!
//! Both ask the trial's [`ScenarioMachine`](crate::scenario::ScenarioMachine)
//! for the outcome, append an event to the
//! [`CallJournal`](crate::journal::CallJournal), and hand the boolean back.
//! A [`Toolbox`] combines the variants selected by a tool configuration.

mod dispatch;
mod facade;
mod named;
mod toolbox;

pub use dispatch::{DispatchTools, DISPATCH_TOOL_NAME};
pub use facade::{ToolCallError, ToolDefinition, ToolFacade, TrialContext};
pub use named::NamedOperationTools;
pub use toolbox::{build_facade, Toolbox};
