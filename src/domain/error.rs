use thiserror::Error;

/// Top-level error type for the client library.
///
/// Callers only ever see configuration and lifecycle failures. Delivery and
/// sanitization failures are absorbed internally and surface through logs,
/// stats and the audit trail.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::ConfigError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] crate::sender::DeliveryError),

    #[error("Sanitization error: {0}")]
    Sanitization(#[from] crate::sanitizer::SanitizationError),

    #[error("Logging initialization error: {0}")]
    Logging(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Client already started")]
    AlreadyRunning,

    #[error("Client has been shut down")]
    ShutDown,
}
