use thiserror::Error;

#[derive(Error, Debug)]
pub enum SanitizationError {
    #[error("Failed to serialize entry: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sanitized entry is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Invalid rule '{description}': {source}")]
    InvalidRule {
        description: String,
        #[source]
        source: regex::Error,
    },
}
