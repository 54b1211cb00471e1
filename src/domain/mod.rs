//! Domain layer for rask-log-client.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEntry`: The pipeline's core data type and wire body
//! - `LogLevel`: Severity (Trace/Debug/Info/Warn/Error/Fatal) and the `accept` filter
//! - `ErrorDetail` / `RawError`: Error normalization
//! - `ClientError`: Top-level error type

pub mod error;
pub mod error_detail;
pub mod log_entry;
pub mod log_level;

pub use error::ClientError;
pub use error_detail::{ErrorDetail, RawError};
pub use log_entry::LogEntry;
pub use log_level::{LogLevel, ParseLevelError, accept};
