//! Aggregated metrics over repeated trials
//!
//! [`aggregate`] is pure: it only looks at the trial summaries it is given.

mod aggregator;

pub use aggregator::{aggregate, AggregatedMetrics, NO_TOOLS_USED};
