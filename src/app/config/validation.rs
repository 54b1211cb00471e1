use super::{Config, ConfigError};
use url::Url;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Credentials first: their absence is the one fatal construction error
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::MissingProjectId);
        }

        // Validate endpoint URL
        let url = Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Endpoint must be http(s), got '{}'",
                url.scheme()
            )));
        }

        if self.project_id.contains('/') {
            return Err(ConfigError::InvalidConfig(
                "Project id must not contain '/'".to_string(),
            ));
        }

        // Validate batch size
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        // Validate timers
        if self.flush_interval.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "Flush interval must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
