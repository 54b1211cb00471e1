use super::client::HttpClient;
use super::error::DeliveryError;
use super::stats::ClientStats;
use crate::domain::LogEntry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Performs single delivery attempts: one POST per entry.
#[derive(Debug, Clone)]
pub struct EntryTransmitter {
    client: HttpClient,
    stats: Arc<ClientStats>,
}

impl EntryTransmitter {
    pub fn new(client: HttpClient, stats: Arc<ClientStats>) -> Self {
        Self { client, stats }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Sends `entry` once and classifies the outcome.
    pub async fn send_once(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        let request = self
            .client
            .client()
            .post(self.client.logs_url().clone())
            .json(entry)
            .build()
            .map_err(|e| DeliveryError::RequestSetup(e.to_string()))?;

        let start = Instant::now();
        self.stats.record_request();

        let response = match self.client.client().execute(request).await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return Err(DeliveryError::RequestSetup(e.to_string()));
            }
            Err(e) => {
                warn!(error = %e, "No response from log endpoint");
                return Err(DeliveryError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        debug!(
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Log endpoint responded"
        );

        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(DeliveryError::from_status(status.as_u16(), message))
    }
}
