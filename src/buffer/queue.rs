use super::batch::{Batch, BatchTrigger};
use crate::domain::LogEntry;
use std::collections::VecDeque;

/// Insertion-ordered entries awaiting delivery.
#[derive(Debug)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    batch_size: usize,
}

impl LogBuffer {
    pub fn new(batch_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(batch_size),
            batch_size,
        }
    }

    /// Appends to the tail and reports whether the size threshold is reached.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        self.entries.push_back(entry);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.batch_size
    }

    /// Moves every buffered entry into a batch, leaving the buffer empty.
    pub fn take_batch(&mut self, trigger: BatchTrigger) -> Option<Batch> {
        if self.entries.is_empty() {
            return None;
        }
        let entries: Vec<LogEntry> = self.entries.drain(..).collect();
        Some(Batch::new(entries, trigger))
    }

    /// Puts entries back ahead of anything buffered since they were taken,
    /// keeping their original relative order.
    pub fn requeue_front(&mut self, entries: Vec<LogEntry>) {
        for entry in entries.into_iter().rev() {
            self.entries.push_front(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}
