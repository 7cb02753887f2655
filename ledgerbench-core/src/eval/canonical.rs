//! Canonical operation strings and their normalization

use crate::journal::{Event, ToolClass};
use regex::Regex;
use std::sync::LazyLock;

/// Suffix appended to the canonical form of a failed operation
pub const FAILED_SUFFIX: &str = "->FAILED";

/// Method name used for single-dispatch events without an operation type
pub const PASSTHROUGH_METHOD: &str = "executeOperation";

/// Method name an event is canonicalized under.
///
/// Single-dispatch events are mapped through the operation type so both facade
/// variants produce the same canonical strings.
pub fn canonical_method(event: &Event) -> &str {
    match event.tool_class {
        ToolClass::SingleDispatch => event
            .params
            .operation
            .map(|op| op.method_name())
            .unwrap_or(PASSTHROUGH_METHOD),
        ToolClass::NamedOperations => &event.method,
    }
}

/// Format a value the way expected patterns write it: integral values keep
/// one decimal (`1000.0`), others use the shortest representation (`1.5`).
pub fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// `method(account,value)`, plus `->FAILED` when the call failed
pub fn canonicalize(event: &Event) -> String {
    let mut op = format!(
        "{}({},{})",
        canonical_method(event),
        event.params.account,
        format_value(event.params.value)
    );
    if !event.result {
        op.push_str(FAILED_SUFFIX);
    }
    op
}

const ZERO_ARGUMENT: &str = ",0)";

static INTEGRAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\.0+\)").expect("integral suffix regex"));

/// Normalize an operation string for comparison.
///
/// Strips all whitespace, collapses integral float suffixes
/// (`1000.0)` becomes `1000)`) and drops a zero last argument
/// (`deposit(A,0)` becomes `deposit(A)`). Applied until nothing changes, so
/// `normalize(normalize(s)) == normalize(s)` for every input.
pub fn normalize(op: &str) -> String {
    let mut current: String = op.chars().filter(|c| !c.is_whitespace()).collect();
    loop {
        let next = INTEGRAL_SUFFIX
            .replace_all(&current, "${1})")
            .replace(ZERO_ARGUMENT, ")");
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Method-name prefix of an operation string (text before the first `(`)
pub fn method_of(op: &str) -> &str {
    op.split('(').next().unwrap_or(op)
}
