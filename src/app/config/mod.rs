pub mod serde_helpers;
mod validation;

use crate::domain::LogLevel;
use crate::reliability::RetryPolicy;
use crate::sanitizer::SanitizationConfig;
use crate::sender::SenderConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API key is required")]
    MissingApiKey,
    #[error("Project id is required")]
    MissingProjectId,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Environment error: {0}")]
    EnvError(String),
}

/// What goes back into the buffer after a flush with failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequeueMode {
    /// Put the whole snapshot back, including entries that were delivered.
    #[default]
    WholeBatch,
    /// Put back only the entries whose delivery failed.
    FailedOnly,
}

pub const DEFAULT_ENDPOINT: &str = "http://localhost:9600/v1/projects";

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub service: Option<String>,
    pub environment: Option<String>,
    pub min_level: LogLevel,
    pub batch_size: usize,
    #[serde(with = "serde_helpers")]
    pub flush_interval: Duration,
    pub max_retries: u32,
    #[serde(with = "serde_helpers")]
    pub retry_base_delay: Duration,
    #[serde(with = "serde_helpers")]
    pub max_retry_delay: Duration,
    #[serde(with = "serde_helpers")]
    pub request_timeout: Duration,
    pub max_connections: usize,
    pub requeue_mode: RequeueMode,
    pub sanitization: SanitizationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            project_id: String::new(),
            service: None,
            environment: None,
            min_level: LogLevel::Info,
            batch_size: 100,
            flush_interval: Duration::from_secs(5),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
            max_connections: 20,
            requeue_mode: RequeueMode::WholeBatch,
            sanitization: SanitizationConfig::default(),
        }
    }
}

// Hand-written so the API key never lands in a log line.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("service", &self.service)
            .field("environment", &self.environment)
            .field("min_level", &self.min_level)
            .field("batch_size", &self.batch_size)
            .field("flush_interval", &self.flush_interval)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("max_retry_delay", &self.max_retry_delay)
            .field("request_timeout", &self.request_timeout)
            .field("max_connections", &self.max_connections)
            .field("requeue_mode", &self.requeue_mode)
            .field("sanitization", &self.sanitization)
            .finish()
    }
}

impl Config {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_requeue_mode(mut self, mode: RequeueMode) -> Self {
        self.requeue_mode = mode;
        self
    }

    pub fn with_sanitization(mut self, sanitization: SanitizationConfig) -> Self {
        self.sanitization = sanitization;
        self
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Overlays `RASK_*` environment variables onto this config.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        use serde_helpers::{load_env_millis, load_env_string, load_env_string_opt, load_env_var};

        load_env_string("RASK_ENDPOINT", &mut self.endpoint);
        load_env_string("RASK_API_KEY", &mut self.api_key);
        load_env_string("RASK_PROJECT_ID", &mut self.project_id);
        load_env_string_opt("RASK_SERVICE", &mut self.service);
        load_env_string_opt("RASK_ENVIRONMENT", &mut self.environment);
        load_env_var("RASK_MIN_LEVEL", &mut self.min_level)?;
        load_env_var("RASK_BATCH_SIZE", &mut self.batch_size)?;
        load_env_millis("RASK_FLUSH_INTERVAL_MS", &mut self.flush_interval)?;
        load_env_var("RASK_MAX_RETRIES", &mut self.max_retries)?;
        load_env_millis("RASK_RETRY_BASE_DELAY_MS", &mut self.retry_base_delay)?;
        load_env_millis("RASK_MAX_RETRY_DELAY_MS", &mut self.max_retry_delay)?;
        load_env_millis("RASK_REQUEST_TIMEOUT_MS", &mut self.request_timeout)?;
        Ok(())
    }

    pub fn sender_config(&self) -> SenderConfig {
        SenderConfig {
            endpoint: self.endpoint.clone(),
            project_id: self.project_id.clone(),
            api_key: self.api_key.clone(),
            timeout: self.request_timeout,
            max_connections: self.max_connections,
            ..SenderConfig::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: self.retry_base_delay,
            max_delay: self.max_retry_delay,
            jitter: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn valid() -> Config {
        Config::new("https://logs.example.com/v1/projects", "key-123", "proj-1")
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.flush_interval, Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(1));
        assert_eq!(config.min_level, LogLevel::Info);
        assert_eq!(config.requeue_mode, RequeueMode::WholeBatch);
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let config = Config::new("https://logs.example.com", "", "proj-1");
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_missing_project_id_rejected() {
        let config = Config::new("https://logs.example.com", "key", "  ");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingProjectId)
        ));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let config = Config::new("not a url", "key", "proj");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        let config = Config::new("ftp://logs.example.com", "key", "proj");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = valid().with_batch_size(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_flush_interval_rejected() {
        let config = valid().with_flush_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("key-123"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_toml_str_with_millis() {
        let config = Config::from_toml_str(
            r#"
            endpoint = "https://logs.example.com/v1/projects"
            api_key = "abc"
            project_id = "p1"
            min_level = "warn"
            batch_size = 10
            flush_interval = 250
            requeue_mode = "failed_only"

            [sanitization]
            failure_mode = "fail_closed"
            "#,
        )
        .unwrap();

        assert_eq!(config.batch_size, 10);
        assert_eq!(config.flush_interval, Duration::from_millis(250));
        assert_eq!(config.min_level, LogLevel::Warn);
        assert_eq!(config.requeue_mode, RequeueMode::FailedOnly);
        assert_eq!(
            config.sanitization.failure_mode,
            crate::sanitizer::FailureMode::FailClosed
        );
        // Unspecified fields keep their defaults
        assert_eq!(config.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = Config::from_toml_str("batch_size = \"many\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_derived_sender_and_retry_settings() {
        let config = valid()
            .with_max_retries(5)
            .with_retry_base_delay(Duration::from_millis(10));
        let sender = config.sender_config();
        assert_eq!(sender.project_id, "proj-1");
        assert_eq!(sender.api_key, "key-123");
        assert_eq!(sender.timeout, Duration::from_secs(30));

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(10));
    }

    const ENV_VARS: &[&str] = &[
        "RASK_BATCH_SIZE",
        "RASK_FLUSH_INTERVAL_MS",
        "RASK_MIN_LEVEL",
        "RASK_MAX_RETRY_DELAY_MS",
        "RASK_SERVICE",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            unsafe { std::env::remove_var(name) };
        }
    }

    #[test]
    #[serial]
    fn test_env_overrides_replace_file_values() {
        clear_env();
        unsafe {
            std::env::set_var("RASK_BATCH_SIZE", "7");
            std::env::set_var("RASK_FLUSH_INTERVAL_MS", "250");
            std::env::set_var("RASK_MIN_LEVEL", "warn");
            std::env::set_var("RASK_MAX_RETRY_DELAY_MS", "2000");
            std::env::set_var("RASK_SERVICE", "billing");
        }

        let mut config = valid().with_batch_size(50);
        let result = config.apply_env_overrides();
        clear_env();

        assert!(result.is_ok());
        assert_eq!(config.batch_size, 7);
        assert_eq!(config.flush_interval, Duration::from_millis(250));
        assert_eq!(config.min_level, LogLevel::Warn);
        assert_eq!(config.max_retry_delay, Duration::from_secs(2));
        assert_eq!(config.retry_policy().max_delay, Duration::from_secs(2));
        assert_eq!(config.service.as_deref(), Some("billing"));
        // Unset variables leave the config alone
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.api_key, "key-123");
    }

    #[test]
    #[serial]
    fn test_unparseable_env_value_is_env_error() {
        clear_env();
        unsafe { std::env::set_var("RASK_BATCH_SIZE", "many") };

        let mut config = valid();
        let result = config.apply_env_overrides();
        clear_env();

        match result {
            Err(ConfigError::EnvError(message)) => assert!(message.contains("RASK_BATCH_SIZE")),
            other => panic!("expected EnvError, got {other:?}"),
        }
        assert_eq!(config.batch_size, 100);
    }
}
