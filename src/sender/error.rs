use thiserror::Error;

/// Outcome of a failed delivery attempt, or of a whole per-entry retry loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliveryError {
    /// No response was received (connect failure, reset, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error: HTTP {status}")]
    Server { status: u16 },

    #[error("Client error: HTTP {status} - {message}")]
    Client { status: u16, message: String },

    #[error("Authentication failed: HTTP {status}")]
    Auth { status: u16 },

    /// The request could not be built or handed to the transport.
    #[error("Request setup error: {0}")]
    RequestSetup(String),

    #[error("Unexpected response status: HTTP {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Delivery failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl DeliveryError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryError::Transport(_)
                | DeliveryError::Server { .. }
                | DeliveryError::UnexpectedStatus { .. }
        )
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, DeliveryError::Auth { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Server { status }
            | DeliveryError::Client { status, .. }
            | DeliveryError::Auth { status }
            | DeliveryError::UnexpectedStatus { status } => Some(*status),
            _ => None,
        }
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => DeliveryError::Auth { status },
            400..=499 => DeliveryError::Client {
                status,
                message: message.into(),
            },
            500..=599 => DeliveryError::Server { status },
            _ => DeliveryError::UnexpectedStatus { status },
        }
    }
}
