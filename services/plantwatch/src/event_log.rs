//! Bounded, newest-first event log shown on the dashboard

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of retained entries
pub const DEFAULT_EVENT_LOG_SIZE: usize = 5;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Warning,
}

/// One line in the dashboard log panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub level: EventLevel,
    pub message: String,
    pub timestamp_epoch_ms: u64,
}

/// Newest entries first; the oldest entry is evicted beyond `max_entries`
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<EventEntry>,
    max_entries: usize,
}

impl EventLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    pub fn push(&mut self, level: EventLevel, message: impl Into<String>, now_ms: u64) {
        self.entries.push_front(EventEntry {
            level,
            message: message.into(),
            timestamp_epoch_ms: now_ms,
        });
        self.entries.truncate(self.max_entries);
    }

    pub fn info(&mut self, message: impl Into<String>, now_ms: u64) {
        self.push(EventLevel::Info, message, now_ms);
    }

    pub fn warn(&mut self, message: impl Into<String>, now_ms: u64) {
        self.push(EventLevel::Warning, message, now_ms);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Entries from newest to oldest
    pub fn entries(&self) -> impl Iterator<Item = &EventEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&EventEntry> {
        self.entries.front()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_SIZE)
    }
}
