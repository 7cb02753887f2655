//! Append-only call journal

use super::event::{Event, EventParams, ToolClass};
use crate::error::{LedgerbenchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Text representation for exporting a journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalFormat {
    /// Pretty-printed JSON array
    #[default]
    Json,

    /// One JSON object per line
    JsonLines,

    /// Comma-separated values with a header row
    Csv,
}

impl JournalFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            JournalFormat::Json => "json",
            JournalFormat::JsonLines => "jsonl",
            JournalFormat::Csv => "csv",
        }
    }
}

const CSV_HEADER: [&str; 9] = [
    "runId",
    "sequence",
    "timestamp",
    "toolClass",
    "method",
    "type",
    "account",
    "value",
    "result",
];

#[derive(Debug, Default)]
struct JournalInner {
    events: Vec<Event>,
    last_timestamp: Option<DateTime<Utc>>,
}

/// Thread-safe, append-only record of every operation call in one trial.
///
/// Sequence numbers are assigned under the same lock that appends the event,
/// so they start at 1, have no gaps, and follow insertion order even when the
/// agent dispatches tool calls from several threads.
#[derive(Debug)]
pub struct CallJournal {
    run_id: String,
    inner: Mutex<JournalInner>,
}

impl CallJournal {
    /// Create an empty journal for a trial
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            inner: Mutex::new(JournalInner::default()),
        }
    }

    /// Trial identifier stamped on every event
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Record a call and return the stored event
    pub fn append(
        &self,
        tool_class: ToolClass,
        method: impl Into<String>,
        params: EventParams,
        result: bool,
    ) -> Event {
        let mut inner = self.lock();

        // Keep timestamps non-decreasing even if the wall clock steps back
        let now = Utc::now();
        let timestamp = match inner.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        inner.last_timestamp = Some(timestamp);

        let event = Event {
            run_id: self.run_id.clone(),
            sequence: inner.events.len() as u64 + 1,
            timestamp,
            tool_class,
            method: method.into(),
            params,
            result,
        };
        inner.events.push(event.clone());
        event
    }

    /// Snapshot of all events in insertion order
    pub fn export_events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct facade names that recorded at least one call, in first-use order
    pub fn tools_used(&self) -> Vec<String> {
        let inner = self.lock();
        let mut used: Vec<String> = Vec::new();
        for event in &inner.events {
            let name = event.tool_class.name();
            if !used.iter().any(|u| u == name) {
                used.push(name.to_string());
            }
        }
        used
    }

    /// Render the journal in the given format
    pub fn serialize(&self, format: JournalFormat) -> Result<String> {
        let events = self.export_events();
        match format {
            JournalFormat::Json => Ok(serde_json::to_string_pretty(&events)?),
            JournalFormat::JsonLines => {
                let mut out = String::new();
                for event in &events {
                    out.push_str(&serde_json::to_string(event)?);
                    out.push('\n');
                }
                Ok(out)
            }
            JournalFormat::Csv => render_csv(&events),
        }
    }

    /// Write the journal to a file
    pub fn save(&self, path: impl AsRef<Path>, format: JournalFormat) -> Result<()> {
        let content = self.serialize(format)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, JournalInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn render_csv(events: &[Event]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for event in events {
        writer.write_record([
            event.run_id.clone(),
            event.sequence.to_string(),
            event.timestamp.to_rfc3339(),
            event.tool_class.name().to_string(),
            event.method.clone(),
            event
                .params
                .operation
                .map(|op| op.as_str().to_string())
                .unwrap_or_default(),
            event.params.account.clone(),
            event.params.value.to_string(),
            event.result.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LedgerbenchError::Persistence(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| LedgerbenchError::Other(format!("CSV output is not UTF-8: {}", e)))
}
