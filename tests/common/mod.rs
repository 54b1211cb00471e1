#![allow(dead_code)]

use rask_log_client::Config;
use std::time::Duration;
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";
pub const PROJECT_ID: &str = "proj-1";
pub const LOGS_PATH: &str = "/v1/projects/proj-1/logs";

/// Config pointed at `server` with fast retries and a timer that never fires
/// on its own during a test.
pub fn test_config(server: &MockServer) -> Config {
    Config::new(format!("{}/v1/projects", server.uri()), API_KEY, PROJECT_ID)
        .with_retry_base_delay(Duration::from_millis(10))
        .with_flush_interval(Duration::from_secs(3600))
}

pub async fn received_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

pub async fn received_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.body_json().unwrap())
        .collect()
}

/// Polls until the server has seen `expected` requests or `timeout` passes.
pub async fn wait_for_requests(server: &MockServer, expected: usize, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if received_count(server).await >= expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    received_count(server).await >= expected
}
