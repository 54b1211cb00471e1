use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNKNOWN_ERROR: &str = "UnknownError";
pub const STRING_ERROR: &str = "StringError";
pub const ERROR_EVENT: &str = "ErrorEvent";

/// Canonical error shape attached to a log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl ErrorDetail {
    fn named(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            message: message.into(),
            stack: None,
            url: None,
            line: None,
            column: None,
        }
    }
}

/// The failure representations callers may hand to the ingestion API.
#[derive(Debug, Clone, PartialEq)]
pub enum RawError {
    /// An explicitly empty error slot.
    Null,
    /// A bare message.
    Message(String),
    /// A structured exception with its own name and optional backtrace.
    Exception {
        name: String,
        message: String,
        stack: Option<String>,
    },
    /// An error event carrying a source location.
    Event {
        message: String,
        filename: Option<String>,
        line: Option<u32>,
        column: Option<u32>,
    },
    /// An arbitrary JSON-like value, handled best-effort.
    Value(Value),
}

impl RawError {
    /// Captures a Rust error: the short type name becomes `name`, the source
    /// chain becomes `stack`.
    pub fn from_error<E: std::error::Error + 'static>(error: &E) -> Self {
        let type_name = std::any::type_name::<E>();
        let name = type_name.rsplit("::").next().unwrap_or(type_name);

        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        RawError::Exception {
            name: name.to_string(),
            message: error.to_string(),
            stack: (!chain.is_empty()).then(|| chain.join("\n")),
        }
    }

    /// Converts into the canonical shape. Total: never panics.
    pub fn normalize(self) -> ErrorDetail {
        match self {
            RawError::Null => ErrorDetail::named(UNKNOWN_ERROR, "Unknown error"),
            RawError::Message(message) => ErrorDetail::named(STRING_ERROR, message),
            RawError::Exception {
                name,
                message,
                stack,
            } => ErrorDetail {
                stack,
                ..ErrorDetail::named(&name, message)
            },
            RawError::Event {
                message,
                filename,
                line,
                column,
            } => ErrorDetail {
                url: filename,
                line,
                column,
                ..ErrorDetail::named(ERROR_EVENT, message)
            },
            RawError::Value(value) => normalize_value(value),
        }
    }
}

impl From<String> for RawError {
    fn from(message: String) -> Self {
        RawError::Message(message)
    }
}

impl From<&str> for RawError {
    fn from(message: &str) -> Self {
        RawError::Message(message.to_string())
    }
}

impl From<Value> for RawError {
    fn from(value: Value) -> Self {
        RawError::Value(value)
    }
}

fn normalize_value(value: Value) -> ErrorDetail {
    match value {
        Value::Null => RawError::Null.normalize(),
        Value::String(message) => RawError::Message(message).normalize(),
        Value::Object(ref map) => {
            let text = |keys: &[&str]| {
                keys.iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .map(str::to_string)
            };
            let number = |keys: &[&str]| {
                keys.iter().find_map(|key| {
                    map.get(*key)
                        .and_then(Value::as_u64)
                        .and_then(|n| u32::try_from(n).ok())
                })
            };

            let name = text(&["name", "type"]);
            let message = text(&["message", "msg", "reason"]);
            let url = text(&["filename", "url", "file", "fileName"]);
            let line = number(&["lineno", "line", "lineNumber"]);
            let column = number(&["colno", "column", "columnNumber"]);

            // An object carrying a location but no name reads as an error event.
            let fallback_name = if url.is_some() || line.is_some() {
                ERROR_EVENT
            } else {
                UNKNOWN_ERROR
            };

            ErrorDetail {
                name: name.unwrap_or_else(|| fallback_name.to_string()),
                message: message.unwrap_or_else(|| value.to_string()),
                stack: text(&["stack", "stacktrace", "backtrace"]),
                url,
                line,
                column,
            }
        }
        other => ErrorDetail::named(UNKNOWN_ERROR, other.to_string()),
    }
}
