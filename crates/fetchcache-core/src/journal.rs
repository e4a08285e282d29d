//! Bounded journal of surfaced errors
//!
//! Handed to the orchestrator explicitly and dropped with it, instead of
//! living in process-wide storage.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

/// Severity level of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Recoverable, data still usable
    Warning,
    /// The operation failed
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    pub recorded_at: DateTime<Utc>,
    /// Operation that failed (`fetch`, `search`, `delete`, ...)
    pub source: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug)]
pub struct ErrorJournal {
    entries: Mutex<VecDeque<JournalEntry>>,
    capacity: usize,
}

impl ErrorJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, source: impl Into<String>, message: impl Into<String>, severity: Severity) {
        let entry = JournalEntry {
            recorded_at: Utc::now(),
            source: source.into(),
            message: message.into(),
            severity,
        };

        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        debug!(source = %entry.source, ?severity, "Error journaled");
        entries.push_back(entry);
    }

    pub fn error(&self, source: impl Into<String>, message: impl Into<String>) {
        self.record(source, message, Severity::Error);
    }

    pub fn warning(&self, source: impl Into<String>, message: impl Into<String>) {
        self.record(source, message, Severity::Warning);
    }

    /// Oldest first
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count()
    }
}

impl Default for ErrorJournal {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_drops_oldest_past_capacity() {
        let journal = ErrorJournal::new(2);
        journal.error("fetch", "first");
        journal.warning("search", "second");
        journal.error("delete", "third");

        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "second");
        assert_eq!(entries[1].source, "delete");
        assert_eq!(journal.error_count(), 1);
    }

    #[test]
    fn test_journal_clear() {
        let journal = ErrorJournal::default();
        assert_eq!(journal.capacity(), 100);
        journal.error("fetch", "boom");
        assert!(!journal.is_empty());

        journal.clear();
        assert_eq!(journal.len(), 0);
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let journal = ErrorJournal::new(usize::MAX / 2);
        assert_eq!(journal.capacity(), usize::MAX / 2);

        journal.error("fetch", "boom");
        assert_eq!(journal.len(), 1);
    }
}
