//! Sanitization pipeline applied to every accepted entry before buffering.
//!
//! Steps, each toggled by [`SanitizationConfig`]:
//! 1. pattern redaction of the message, error detail and every string leaf of
//!    `data`, `context` and `metadata` (built-in rules, then custom rules)
//! 2. field anonymization by key name or dotted path
//! 3. audit recording into a bounded trail
//!
//! A failing step never drops an entry silently: under
//! [`FailureMode::FailOpen`] the caller gets the original entry back
//! unredacted, under [`FailureMode::FailClosed`] the entry is discarded.

pub mod anonymize;
pub mod audit;
pub mod error;
pub mod retention;
pub mod rules;

pub use anonymize::{FieldAnonymizer, SHORT_VALUE_MASK, mask_value};
pub use audit::{AuditEntry, AuditOperation, AuditTrail, ERROR_MARKER};
pub use error::SanitizationError;
pub use retention::{RetentionCache, RetentionPolicy, RetentionRecord};
pub use rules::{RuleCategory, RuleSeverity, SanitizationRule, builtin_rules};

use crate::domain::LogEntry;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{error, warn};

/// Substituted for any payload node nested deeper than `max_depth`.
pub const CIRCULAR_SENTINEL: &str = "[Circular Reference]";

const USER_ID_KEYS: &[&str] = &["userId", "user_id"];
const SESSION_ID_KEYS: &[&str] = &["sessionId", "session_id"];

/// What `sanitize` does when a pipeline step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Deliver the original, unredacted entry.
    #[default]
    FailOpen,
    /// Drop the entry.
    FailClosed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizationConfig {
    pub enabled: bool,
    pub redact_strings: bool,
    pub anonymize_fields: bool,
    pub sensitive_fields: Vec<String>,
    pub audit_enabled: bool,
    pub max_audit_entries: usize,
    pub max_depth: usize,
    pub max_entry_bytes: Option<usize>,
    pub failure_mode: FailureMode,
    pub retention: RetentionPolicy,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_strings: true,
            anonymize_fields: true,
            sensitive_fields: [
                "password",
                "passwd",
                "secret",
                "token",
                "api_key",
                "apikey",
                "authorization",
                "credential",
                "private_key",
            ]
            .iter()
            .map(|field| field.to_string())
            .collect(),
            audit_enabled: true,
            max_audit_entries: 1000,
            max_depth: 32,
            max_entry_bytes: None,
            failure_mode: FailureMode::FailOpen,
            retention: RetentionPolicy::default(),
        }
    }
}

/// Result of one successful pass, before audit recording.
struct Processed {
    entry: LogEntry,
    rules_applied: Vec<String>,
    original_size: usize,
    processed_size: usize,
}

/// Redaction, anonymization, audit and retention bookkeeping.
///
/// Safe to share across threads; locks are never held across an await.
pub struct Sanitizer {
    config: RwLock<SanitizationConfig>,
    custom_rules: RwLock<Vec<SanitizationRule>>,
    audit: Mutex<AuditTrail>,
    retention: Mutex<RetentionCache>,
}

impl Sanitizer {
    pub fn new(config: SanitizationConfig) -> Self {
        let audit = AuditTrail::new(config.max_audit_entries);
        Self {
            config: RwLock::new(config),
            custom_rules: RwLock::new(Vec::new()),
            audit: Mutex::new(audit),
            retention: Mutex::new(RetentionCache::new()),
        }
    }

    /// Sanitizes `entry`.
    ///
    /// Returns `None` only when a step failed and the failure mode is
    /// [`FailureMode::FailClosed`].
    pub fn sanitize(&self, entry: LogEntry) -> Option<LogEntry> {
        let config = self.config.read().clone();
        if !config.enabled {
            return Some(entry);
        }

        let started = Instant::now();
        match self.process(&entry, &config) {
            Ok(processed) => {
                if config.audit_enabled {
                    let mut audit_entry = AuditEntry::new(AuditOperation::Sanitize, "log_entry");
                    audit_entry.original_size = processed.original_size;
                    audit_entry.processed_size = processed.processed_size;
                    audit_entry.rules_applied = processed.rules_applied;
                    attach_identity(&mut audit_entry, &processed.entry);
                    audit_entry
                        .metadata
                        .insert("durationMs".to_string(), duration_ms(started).into());
                    audit_entry
                        .metadata
                        .insert("level".to_string(), processed.entry.level.as_str().into());
                    self.audit.lock().record(audit_entry);
                }
                Some(processed.entry)
            }
            Err(e) => {
                let mut audit_entry = AuditEntry::new(AuditOperation::Sanitize, "log_entry");
                audit_entry.rules_applied.push(ERROR_MARKER.to_string());
                attach_identity(&mut audit_entry, &entry);
                audit_entry
                    .metadata
                    .insert("error".to_string(), e.to_string().into());
                audit_entry
                    .metadata
                    .insert("durationMs".to_string(), duration_ms(started).into());
                self.audit.lock().record(audit_entry);

                match config.failure_mode {
                    FailureMode::FailOpen => {
                        warn!(
                            error = %e,
                            "Sanitization failed; forwarding UNREDACTED entry (fail-open)"
                        );
                        Some(entry)
                    }
                    FailureMode::FailClosed => {
                        error!(error = %e, "Sanitization failed; dropping entry (fail-closed)");
                        None
                    }
                }
            }
        }
    }

    fn process(&self, entry: &LogEntry, config: &SanitizationConfig) -> Result<Processed, SanitizationError> {
        let original_size = estimate_size(entry)?;
        let mut sanitized = entry.clone();
        let mut rules_applied = Vec::new();

        if config.redact_strings {
            let custom = self.custom_rules.read();
            let rules: Vec<&SanitizationRule> = builtin_rules().iter().chain(custom.iter()).collect();
            let redactor = Redactor {
                rules: &rules,
                max_depth: config.max_depth,
            };

            redactor.redact_string(&mut sanitized.message, &mut rules_applied);
            if let Some(detail) = sanitized.error.as_mut() {
                redactor.redact_string(&mut detail.name, &mut rules_applied);
                redactor.redact_string(&mut detail.message, &mut rules_applied);
                for text in [detail.stack.as_mut(), detail.url.as_mut()].into_iter().flatten() {
                    redactor.redact_string(text, &mut rules_applied);
                }
            }
            if let Some(data) = sanitized.data.as_mut() {
                redactor.redact_value(data, 0, &mut rules_applied);
            }
            for value in sanitized.context.values_mut() {
                redactor.redact_value(value, 1, &mut rules_applied);
            }
            for value in sanitized.metadata.values_mut() {
                redactor.redact_value(value, 1, &mut rules_applied);
            }
        }

        if config.anonymize_fields {
            let mut anonymizer =
                FieldAnonymizer::new(&config.sensitive_fields, config.max_depth, &mut rules_applied);

            if let Some(data) = sanitized.data.as_mut() {
                anonymizer.anonymize("data", data);
            }
            let mut context = Value::Object(std::mem::take(&mut sanitized.context));
            anonymizer.anonymize("context", &mut context);
            if let Value::Object(map) = context {
                sanitized.context = map;
            }
            let mut metadata = Value::Object(std::mem::take(&mut sanitized.metadata));
            anonymizer.anonymize("metadata", &mut metadata);
            if let Value::Object(map) = metadata {
                sanitized.metadata = map;
            }
        }

        let processed_size = estimate_size(&sanitized)?;
        if let Some(limit) = config.max_entry_bytes {
            if processed_size > limit {
                return Err(SanitizationError::PayloadTooLarge {
                    size: processed_size,
                    limit,
                });
            }
        }

        Ok(Processed {
            entry: sanitized,
            rules_applied,
            original_size,
            processed_size,
        })
    }

    /// Appends a custom rule; custom rules run after the built-ins in
    /// registration order.
    pub fn add_custom_rule(&self, rule: SanitizationRule) {
        self.custom_rules.write().push(rule);
    }

    /// Removes every custom rule with this description. Built-ins are
    /// immutable and never matched.
    pub fn remove_custom_rule(&self, description: &str) -> bool {
        let mut rules = self.custom_rules.write();
        let before = rules.len();
        rules.retain(|rule| rule.description() != description);
        rules.len() != before
    }

    pub fn custom_rules(&self) -> Vec<SanitizationRule> {
        self.custom_rules.read().clone()
    }

    /// Replaces the configuration wholesale; applies to later calls only.
    pub fn update_config(&self, config: SanitizationConfig) {
        self.audit.lock().set_max_entries(config.max_audit_entries);
        *self.config.write() = config;
    }

    pub fn config(&self) -> SanitizationConfig {
        self.config.read().clone()
    }

    pub fn audit_trail(&self) -> Vec<AuditEntry> {
        self.audit.lock().snapshot()
    }

    pub fn clear_audit_trail(&self) {
        self.audit.lock().clear();
    }

    /// Checks `id` against the retention policy, recording it when retained.
    pub fn should_retain(&self, id: &str, timestamp: DateTime<Utc>, size: usize) -> bool {
        let config = self.config.read();
        let mut audit = self.audit.lock();
        let audit = config.audit_enabled.then_some(&mut *audit);
        self.retention
            .lock()
            .should_retain(&config.retention, id, timestamp, size, audit)
    }

    /// Evicts retained ids past the policy's limits; returns the count.
    pub fn cleanup_expired(&self) -> usize {
        let config = self.config.read();
        let mut audit = self.audit.lock();
        let audit = config.audit_enabled.then_some(&mut *audit);
        let evicted = self.retention.lock().cleanup_expired(&config.retention, audit);
        if evicted > 0 {
            tracing::info!(evicted, "Retention cleanup evicted expired records");
        }
        evicted
    }

    pub fn retained_count(&self) -> usize {
        self.retention.lock().len()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(SanitizationConfig::default())
    }
}

impl std::fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sanitizer")
            .field("config", &*self.config.read())
            .field("custom_rules", &self.custom_rules.read().len())
            .field("audit_entries", &self.audit.lock().len())
            .finish()
    }
}

/// Depth-first redaction over a payload tree.
struct Redactor<'r> {
    rules: &'r [&'r SanitizationRule],
    max_depth: usize,
}

impl Redactor<'_> {
    fn redact_string(&self, text: &mut String, applied: &mut Vec<String>) {
        rules::redact_str(text, self.rules, applied);
    }

    fn redact_value(&self, value: &mut Value, depth: usize, applied: &mut Vec<String>) {
        if depth >= self.max_depth && (value.is_array() || value.is_object()) {
            *value = Value::String(CIRCULAR_SENTINEL.to_string());
            return;
        }

        match value {
            Value::String(text) => self.redact_string(text, applied),
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.redact_value(item, depth + 1, applied);
                }
            }
            Value::Object(map) => {
                for child in map.values_mut() {
                    self.redact_value(child, depth + 1, applied);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

/// Approximate wire size of an entry, in bytes.
pub fn estimate_size(entry: &LogEntry) -> Result<usize, SanitizationError> {
    Ok(serde_json::to_vec(entry)?.len())
}

fn attach_identity(audit_entry: &mut AuditEntry, entry: &LogEntry) {
    audit_entry.user_id = entry.context_str(USER_ID_KEYS).map(str::to_string);
    audit_entry.session_id = entry.context_str(SESSION_ID_KEYS).map(str::to_string);
}

fn duration_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
