use super::audit::{AuditEntry, AuditOperation, AuditTrail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Age and size limits for processed data kept in the retention cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    #[serde(with = "crate::app::config::serde_helpers")]
    pub max_age: Duration,
    pub max_size: usize,
    pub auto_delete: bool,
    pub archive_before_delete: bool,
    pub categories: Vec<String>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(30 * 24 * 60 * 60), // 30 days
            max_size: 10 * 1024 * 1024,                       // 10MB
            auto_delete: true,
            archive_before_delete: false,
            categories: vec!["logs".to_string()],
        }
    }
}

impl RetentionPolicy {
    fn data_type(&self) -> String {
        if self.categories.is_empty() {
            "retention".to_string()
        } else {
            self.categories.join(",")
        }
    }

    fn is_expired(&self, record: &RetentionRecord, now: DateTime<Utc>) -> bool {
        age_of(record.timestamp, now) > self.max_age || record.size > self.max_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionRecord {
    pub timestamp: DateTime<Utc>,
    pub size: usize,
}

/// Side cache of retained ids. Populated only through explicit calls.
#[derive(Debug, Default)]
pub struct RetentionCache {
    records: HashMap<String, RetentionRecord>,
}

impl RetentionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates age and size against `policy`; retained ids are recorded.
    pub fn should_retain(
        &mut self,
        policy: &RetentionPolicy,
        id: &str,
        timestamp: DateTime<Utc>,
        size: usize,
        audit: Option<&mut AuditTrail>,
    ) -> bool {
        let record = RetentionRecord { timestamp, size };
        if policy.is_expired(&record, Utc::now()) {
            return false;
        }

        self.records.insert(id.to_string(), record);
        if let Some(audit) = audit {
            let mut entry = AuditEntry::new(AuditOperation::Retain, policy.data_type());
            entry.original_size = size;
            entry.processed_size = size;
            entry.metadata.insert("id".to_string(), id.into());
            audit.record(entry);
        }
        true
    }

    /// Evicts every record past the policy's age or size limit and returns
    /// how many were evicted. Nothing is evicted unless `auto_delete` is set.
    pub fn cleanup_expired(&mut self, policy: &RetentionPolicy, mut audit: Option<&mut AuditTrail>) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = self
            .records
            .iter()
            .filter(|(_, record)| policy.is_expired(record, now))
            .map(|(id, _)| id.clone())
            .collect();

        if !policy.auto_delete {
            if !expired.is_empty() {
                tracing::debug!(
                    expired = expired.len(),
                    "Retention cleanup skipped: auto_delete disabled"
                );
            }
            return 0;
        }

        for id in &expired {
            let Some(record) = self.records.remove(id) else {
                continue;
            };

            if let Some(audit) = audit.as_deref_mut() {
                if policy.archive_before_delete {
                    audit.record(retention_audit(policy, AuditOperation::Archive, id, record.size));
                }
                audit.record(retention_audit(policy, AuditOperation::Delete, id, record.size));
            }
        }

        expired.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn retention_audit(policy: &RetentionPolicy, operation: AuditOperation, id: &str, size: usize) -> AuditEntry {
    let mut entry = AuditEntry::new(operation, policy.data_type());
    entry.original_size = size;
    entry.metadata.insert("id".to_string(), id.into());
    entry
}

fn age_of(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    // Future timestamps count as zero age.
    (now - timestamp).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn policy() -> RetentionPolicy {
        RetentionPolicy {
            max_age: Duration::from_secs(3600),
            max_size: 1000,
            ..Default::default()
        }
    }

    #[test]
    fn test_retains_fresh_small_records() {
        let mut cache = RetentionCache::new();
        assert!(cache.should_retain(&policy(), "a", Utc::now(), 10, None));
        assert!(cache.contains("a"));
    }

    #[test]
    fn test_rejects_old_or_large_records() {
        let mut cache = RetentionCache::new();
        let old = Utc::now() - ChronoDuration::hours(2);
        assert!(!cache.should_retain(&policy(), "old", old, 10, None));
        assert!(!cache.should_retain(&policy(), "big", Utc::now(), 5000, None));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_evicts_expired_and_audits() {
        let mut cache = RetentionCache::new();
        let mut audit = AuditTrail::new(100);
        let mut loose = policy();
        loose.max_age = Duration::from_secs(7200);

        let aged = Utc::now() - ChronoDuration::minutes(90);
        assert!(cache.should_retain(&loose, "aged", aged, 10, Some(&mut audit)));
        assert!(cache.should_retain(&loose, "fresh", Utc::now(), 10, Some(&mut audit)));
        assert_eq!(audit.len(), 2);

        let mut strict = policy();
        strict.archive_before_delete = true;
        let evicted = cache.cleanup_expired(&strict, Some(&mut audit));

        assert_eq!(evicted, 1);
        assert!(!cache.contains("aged"));
        assert!(cache.contains("fresh"));

        let operations: Vec<AuditOperation> = audit.snapshot().iter().map(|e| e.operation).collect();
        assert_eq!(
            operations,
            vec![
                AuditOperation::Retain,
                AuditOperation::Retain,
                AuditOperation::Archive,
                AuditOperation::Delete
            ]
        );
    }

    #[test]
    fn test_cleanup_without_auto_delete_keeps_records() {
        let mut cache = RetentionCache::new();
        let mut loose = policy();
        loose.max_age = Duration::from_secs(7200);
        let aged = Utc::now() - ChronoDuration::minutes(90);
        cache.should_retain(&loose, "aged", aged, 10, None);

        let mut strict = policy();
        strict.auto_delete = false;
        assert_eq!(cache.cleanup_expired(&strict, None), 0);
        assert!(cache.contains("aged"));
    }
}
