use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Severity of a log entry.
///
/// Variants are declared in rank order, so the derived `Ord` gives
/// `Trace < Debug < Info < Warn < Error < Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid log level '{input}'. Valid levels: trace, debug, info, warn, error, fatal")]
pub struct ParseLevelError {
    pub input: String,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Ordinal rank, 0 for `Trace` through 5 for `Fatal`.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    /// True when an entry at `self` passes a `min_level` threshold.
    pub fn accepts(self, min_level: LogLevel) -> bool {
        accept(self, min_level)
    }
}

/// Severity filter: admits `level` iff its rank is at least `min_level`'s.
pub fn accept(level: LogLevel, min_level: LogLevel) -> bool {
    level.rank() >= min_level.rank()
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" | "critical" => Ok(LogLevel::Fatal),
            _ => Err(ParseLevelError {
                input: s.to_string(),
            }),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error | LogLevel::Fatal => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_matches_rank_order_for_every_pair() {
        for (i, level) in LogLevel::ALL.iter().enumerate() {
            for (j, min) in LogLevel::ALL.iter().enumerate() {
                assert_eq!(accept(*level, *min), i >= j, "{level} vs min {min}");
            }
        }
    }

    #[test]
    fn test_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
        assert_eq!(LogLevel::Fatal.rank(), 5);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(" Fatal ".parse::<LogLevel>().unwrap(), LogLevel::Fatal);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&LogLevel::Error).unwrap();
        assert_eq!(json, "\"error\"");
        let level: LogLevel = serde_json::from_str("\"trace\"").unwrap();
        assert_eq!(level, LogLevel::Trace);
    }
}
