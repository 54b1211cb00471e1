use super::error::DeliveryError;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use url::Url;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub max_connections: usize,
    pub keep_alive_timeout: Duration,
    pub user_agent: String,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9600/v1/projects".to_string(),
            project_id: String::new(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            max_connections: 20,
            keep_alive_timeout: Duration::from_secs(60),
            user_agent: format!("rask-log-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Pooled HTTP client bound to one project's ingestion URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: SenderConfig,
    logs_url: Url,
    headers: HeaderMap,
}

impl HttpClient {
    pub fn new(config: SenderConfig) -> Result<Self, DeliveryError> {
        let logs_url = logs_url(&config.endpoint, &config.project_id)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| DeliveryError::RequestSetup(format!("Invalid API key header: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .pool_max_idle_per_host(config.max_connections)
            .pool_idle_timeout(config.keep_alive_timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers.clone())
            .build()
            .map_err(|e| DeliveryError::RequestSetup(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            logs_url,
            headers,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// `{endpoint}/{project_id}/logs`
    pub fn logs_url(&self) -> &Url {
        &self.logs_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Joins the endpoint and project id into the ingestion URL.
pub fn logs_url(endpoint: &str, project_id: &str) -> Result<Url, DeliveryError> {
    let raw = format!("{}/{}/logs", endpoint.trim_end_matches('/'), project_id);
    Url::parse(&raw).map_err(|e| DeliveryError::RequestSetup(format!("Invalid logs URL '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> SenderConfig {
        SenderConfig {
            endpoint: endpoint.to_string(),
            project_id: "proj-1".to_string(),
            api_key: "key-123".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_logs_url_joins_project() {
        let url = logs_url("https://logs.example.com/api", "proj-1").unwrap();
        assert_eq!(url.as_str(), "https://logs.example.com/api/proj-1/logs");

        let url = logs_url("https://logs.example.com/api/", "proj-1").unwrap();
        assert_eq!(url.as_str(), "https://logs.example.com/api/proj-1/logs");
    }

    #[test]
    fn test_invalid_endpoint_is_setup_error() {
        let err = HttpClient::new(config("not a url")).unwrap_err();
        assert!(matches!(err, DeliveryError::RequestSetup(_)));
    }

    #[test]
    fn test_headers_carry_api_key() {
        let client = HttpClient::new(config("http://localhost:9600")).unwrap();
        assert_eq!(client.headers()[API_KEY_HEADER], "key-123");
        assert_eq!(client.headers()[CONTENT_TYPE], "application/json");
        assert!(client.headers()[API_KEY_HEADER].is_sensitive());
    }

    #[test]
    fn test_api_key_with_newline_is_rejected() {
        let mut bad = config("http://localhost:9600");
        bad.api_key = "key\nwith-newline".to_string();
        assert!(matches!(HttpClient::new(bad), Err(DeliveryError::RequestSetup(_))));
    }
}
