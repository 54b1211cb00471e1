use super::retry::RetryPolicy;
use crate::buffer::Batch;
use crate::domain::LogEntry;
use crate::sender::{ClientStats, DeliveryError, EntryTransmitter};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Settled per-entry results for one batch, in snapshot order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub batch_id: String,
    pub results: Vec<Result<u32, DeliveryError>>,
}

impl BatchOutcome {
    /// True only if every entry was delivered.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }

    pub fn delivered(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_err())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn first_error(&self) -> Option<&DeliveryError> {
        self.results.iter().find_map(|r| r.as_ref().err())
    }
}

/// Per-entry delivery with bounded retries and exponential backoff.
#[derive(Debug, Clone)]
pub struct DeliveryEngine {
    transmitter: EntryTransmitter,
    policy: RetryPolicy,
    stats: Arc<ClientStats>,
}

impl DeliveryEngine {
    pub fn new(transmitter: EntryTransmitter, policy: RetryPolicy, stats: Arc<ClientStats>) -> Self {
        Self {
            transmitter,
            policy,
            stats,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Delivers one entry, returning the number of attempts it took.
    ///
    /// Retryable failures back off and try again until attempts
    /// `0..=max_retries` are used up; anything else fails immediately.
    pub async fn deliver_entry(&self, entry: &LogEntry) -> Result<u32, DeliveryError> {
        let mut last_error = None;

        for attempt in 0..=self.policy.max_retries {
            match self.transmitter.send_once(entry).await {
                Ok(()) => {
                    debug!(attempt, "Entry delivered");
                    return Ok(attempt + 1);
                }
                Err(e) if e.is_auth() => {
                    self.stats.record_auth_failure();
                    error!(
                        status = e.status(),
                        "Authentication failed: log endpoint rejected the API key"
                    );
                    return Err(e);
                }
                Err(e) if !e.is_retryable() => {
                    error!(error = %e, attempt, "Non-retryable delivery failure");
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Delivery attempt failed");
                    last_error = Some(e);
                }
            }

            if self.policy.should_retry_after(attempt) {
                let delay = self.policy.calculate_delay(attempt);
                self.stats.record_retry();
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }
        }

        let attempts = self.policy.total_attempts();
        error!(attempts, "Delivery failed: retries exhausted");
        Err(DeliveryError::Exhausted {
            attempts,
            last: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    /// Delivers every entry of `batch` concurrently and waits for all of
    /// them to settle.
    pub async fn deliver_batch(&self, batch: &Batch) -> BatchOutcome {
        let results = join_all(batch.entries().iter().map(|entry| self.deliver_entry(entry))).await;

        let outcome = BatchOutcome {
            batch_id: batch.id().to_string(),
            results,
        };

        let delivered = outcome.delivered();
        let failed = outcome.results.len() - delivered;
        self.stats.record_delivered(delivered);
        self.stats.record_failed(failed);

        if failed == 0 {
            info!(batch_id = %outcome.batch_id, delivered, "Batch delivered");
        } else {
            warn!(batch_id = %outcome.batch_id, delivered, failed, "Batch delivery failed");
        }

        outcome
    }
}
