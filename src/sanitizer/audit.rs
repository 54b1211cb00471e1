use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// Marker recorded in `rules_applied` when the pipeline itself failed.
pub const ERROR_MARKER: &str = "ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOperation {
    Sanitize,
    Anonymize,
    Retain,
    Delete,
    Archive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: AuditOperation,
    pub data_type: String,
    pub original_size: usize,
    pub processed_size: usize,
    pub rules_applied: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AuditEntry {
    pub fn new(operation: AuditOperation, data_type: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            data_type: data_type.into(),
            original_size: 0,
            processed_size: 0,
            rules_applied: Vec::new(),
            user_id: None,
            session_id: None,
            metadata: Map::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.rules_applied.iter().any(|rule| rule == ERROR_MARKER)
    }
}

/// Bounded FIFO history of sanitization operations.
#[derive(Debug)]
pub struct AuditTrail {
    entries: VecDeque<AuditEntry>,
    max_entries: usize,
}

impl AuditTrail {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries.min(1024)),
            max_entries,
        }
    }

    /// Appends an entry, evicting the oldest ones beyond the bound.
    pub fn record(&mut self, entry: AuditEntry) {
        self.entries.push_back(entry);
        self.enforce_bound();
    }

    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries;
        self.enforce_bound();
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<AuditEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn enforce_bound(&mut self) {
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }
}
