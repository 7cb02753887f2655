//! Call journal for operation requests
//!
//! Every operation the agent requests is appended to a per-trial
//! [`CallJournal`] together with the outcome the scenario decided. The journal
//! is the evaluator's only input about what the agent did.

mod call_log;
mod event;

pub use call_log::{CallJournal, JournalFormat};
pub use event::{Event, EventParams, ToolClass};
