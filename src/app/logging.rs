use crate::domain::{ClientError, LogLevel};
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Targets that are far too chatty at the client's own level.
const QUIET_TARGETS: &[(&str, LogLevel)] = &[
    ("hyper", LogLevel::Warn),
    ("hyper_util", LogLevel::Warn),
    ("reqwest", LogLevel::Warn),
    ("h2", LogLevel::Warn),
    ("rustls", LogLevel::Warn),
];

/// Output format of the diagnostic subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Builds an `EnvFilter` directive string: the default level first, then one
/// `target=level` directive per quiet target.
pub fn build_filter_string(default_level: LogLevel) -> String {
    let mut parts = Vec::with_capacity(QUIET_TARGETS.len() + 1);
    parts.push(tracing_level_str(default_level).to_string());
    for (target, level) in QUIET_TARGETS {
        parts.push(format!("{target}={}", tracing_level_str(*level)));
    }
    parts.join(",")
}

// `fatal` has no tracing counterpart.
fn tracing_level_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Fatal => "error",
        other => other.as_str(),
    }
}

/// Installs a global tracing subscriber for the client's own diagnostics.
///
/// Optional: a host application with its own subscriber should not call
/// this. `RUST_LOG` takes precedence over `default_level` when set. Only the
/// first call installs anything; later calls return the first outcome.
pub fn init_logging(default_level: LogLevel, format: LogFormat) -> Result<(), ClientError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();

    INIT.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(build_filter_string(default_level)))
            .map_err(|e| format!("Failed to create EnvFilter: {e}"))?;

        let registry = tracing_subscriber::registry().with(env_filter);
        let result = match format {
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .compact(),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_target(true).with_current_span(false))
                .try_init(),
        };
        result.map_err(|e| format!("Failed to set global tracing subscriber: {e}"))
    })
    .clone()
    .map_err(ClientError::Logging)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_string_starts_with_default_level() {
        let filter = build_filter_string(LogLevel::Debug);
        assert!(filter.starts_with("debug,"));
        assert!(filter.contains("hyper=warn"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    fn test_fatal_maps_to_error_directive() {
        let filter = build_filter_string(LogLevel::Fatal);
        assert!(filter.starts_with("error,"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        let first = init_logging(LogLevel::Info, LogFormat::Compact);
        let second = init_logging(LogLevel::Trace, LogFormat::Json);
        assert_eq!(first.is_ok(), second.is_ok());
    }
}
