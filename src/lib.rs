#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Safe within realistic value bounds (durations, sizes)
    clippy::cast_precision_loss,      // Backoff math runs in f64
    clippy::cast_sign_loss,           // Safe where values are known non-negative
    clippy::missing_errors_doc,       // Error enums document themselves
    clippy::module_name_repetitions,  // e.g. SanitizationError in sanitizer module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown
)]

//! Client-side log shipping.
//!
//! Entries pass a severity filter, are normalized and sanitized, then
//! buffered and delivered to `{endpoint}/{project_id}/logs` with per-entry
//! retry and backoff. See [`LogClient`] for the entry point.

pub mod app;
pub mod buffer;
pub mod domain;
pub mod reliability;
pub mod sanitizer;
pub mod sender;

// Re-export main types for easy access
pub use app::{Config, ConfigError, FlushOutcome, LifecycleState, LogClient, RequeueMode};
pub use domain::{ClientError, ErrorDetail, LogEntry, LogLevel, RawError};
pub use sanitizer::{SanitizationConfig, SanitizationRule, Sanitizer};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
