// Lock-free delivery statistics using atomic operations

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the client, the delivery engine and the transmitter.
#[derive(Debug, Default)]
pub struct ClientStats {
    entries_accepted: AtomicU64,
    entries_rejected: AtomicU64,
    entries_filtered: AtomicU64,
    entries_dropped: AtomicU64,
    flushes_started: AtomicU64,
    flushes_skipped: AtomicU64,
    requests_sent: AtomicU64,
    entries_delivered: AtomicU64,
    entries_failed: AtomicU64,
    retries: AtomicU64,
    entries_requeued: AtomicU64,
    entries_discarded: AtomicU64,
    auth_failures: AtomicU64,
}

/// Point-in-time copy of [`ClientStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub entries_accepted: u64,
    pub entries_rejected: u64,
    pub entries_filtered: u64,
    pub entries_dropped: u64,
    pub flushes_started: u64,
    pub flushes_skipped: u64,
    pub requests_sent: u64,
    pub entries_delivered: u64,
    pub entries_failed: u64,
    pub retries: u64,
    pub entries_requeued: u64,
    pub entries_discarded: u64,
    pub auth_failures: u64,
}

impl ClientStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry sanitized and buffered.
    pub fn record_accepted(&self) {
        self.entries_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Entry refused because the client is shutting down or stopped.
    pub fn record_rejected(&self) {
        self.entries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Entry below the minimum level.
    pub fn record_filtered(&self) {
        self.entries_filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Entry discarded by fail-closed sanitization.
    pub fn record_dropped(&self) {
        self.entries_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush_started(&self) {
        self.flushes_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush_skipped(&self) {
        self.flushes_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self, count: usize) {
        self.entries_delivered.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_failed(&self, count: usize) {
        self.entries_failed.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// One backoff sleep between attempts.
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_requeued(&self, count: usize) {
        self.entries_requeued.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Entries left in the buffer when shutdown completed.
    pub fn record_discarded(&self, count: usize) {
        self.entries_discarded.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            entries_accepted: self.entries_accepted.load(Ordering::Relaxed),
            entries_rejected: self.entries_rejected.load(Ordering::Relaxed),
            entries_filtered: self.entries_filtered.load(Ordering::Relaxed),
            entries_dropped: self.entries_dropped.load(Ordering::Relaxed),
            flushes_started: self.flushes_started.load(Ordering::Relaxed),
            flushes_skipped: self.flushes_skipped.load(Ordering::Relaxed),
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            entries_delivered: self.entries_delivered.load(Ordering::Relaxed),
            entries_failed: self.entries_failed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            entries_requeued: self.entries_requeued.load(Ordering::Relaxed),
            entries_discarded: self.entries_discarded.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
        }
    }
}
