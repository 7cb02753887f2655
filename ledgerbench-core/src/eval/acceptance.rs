//! Acceptance criteria listing

use super::pattern::ExpectedPattern;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

pub const ACCEPTANCE_HEADER: &str = "Acceptance criteria (prompt+scenario -> expected operations):";

/// Ordered `(prompt+suffix) -> pattern` entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceTable {
    entries: Vec<(String, ExpectedPattern)>,
}

impl AcceptanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing the pattern of an existing key in place
    pub fn insert(&mut self, key: impl Into<String>, pattern: ExpectedPattern) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = pattern,
            None => self.entries.push((key, pattern)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ExpectedPattern> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, pattern)| pattern)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable listing, one block per key
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", ACCEPTANCE_HEADER);
        let _ = writeln!(out);
        for (key, pattern) in &self.entries {
            let _ = writeln!(out, "{}:", key);
            for element in pattern {
                let _ = writeln!(out, "  - {}", element);
            }
            let _ = writeln!(out);
        }
        out
    }
}

impl<K: Into<String>> FromIterator<(K, ExpectedPattern)> for AcceptanceTable {
    fn from_iter<T: IntoIterator<Item = (K, ExpectedPattern)>>(iter: T) -> Self {
        let mut table = AcceptanceTable::new();
        for (key, pattern) in iter {
            table.insert(key, pattern);
        }
        table
    }
}
