use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rask_log_client::sanitizer::{SanitizationConfig, Sanitizer, mask_value};
use rask_log_client::{LogEntry, LogLevel};
use serde_json::json;

fn sample_entry() -> LogEntry {
    LogEntry::new(
        LogLevel::Info,
        "user jane.doe@example.com logged in from 10.0.0.12 with Bearer abc.def.ghi",
    )
    .with_data(json!({
        "user": {
            "email": "jane.doe@example.com",
            "password": "hunter2hunter2",
            "ssn": "123-45-6789",
        },
        "cart": [
            {"sku": "A-1", "qty": 2},
            {"sku": "B-7", "qty": 1, "note": "call 555-123-4567"},
        ],
        "api_key": "sk_live_0123456789abcdef",
    }))
}

fn benchmark_sanitize_entry(c: &mut Criterion) {
    let entry = sample_entry();
    let size = serde_json::to_vec(&entry).map(|v| v.len()).unwrap_or(0);

    let mut group = c.benchmark_group("sanitize");
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("default_config", |b| {
        let sanitizer = Sanitizer::new(SanitizationConfig::default());
        b.iter(|| sanitizer.sanitize(std::hint::black_box(entry.clone())));
    });

    group.bench_function("redaction_only", |b| {
        let sanitizer = Sanitizer::new(SanitizationConfig {
            anonymize_fields: false,
            audit_enabled: false,
            ..SanitizationConfig::default()
        });
        b.iter(|| sanitizer.sanitize(std::hint::black_box(entry.clone())));
    });

    group.bench_function("disabled", |b| {
        let sanitizer = Sanitizer::new(SanitizationConfig {
            enabled: false,
            ..SanitizationConfig::default()
        });
        b.iter(|| sanitizer.sanitize(std::hint::black_box(entry.clone())));
    });

    group.finish();
}

fn benchmark_deep_payload(c: &mut Criterion) {
    let mut nested = json!("leaf secret=abc123");
    for depth in 0..64 {
        nested = json!({ format!("level{depth}"): nested });
    }
    let entry = LogEntry::new(LogLevel::Warn, "deep payload").with_data(nested);
    let sanitizer = Sanitizer::new(SanitizationConfig::default());

    c.bench_function("sanitize_depth_64", |b| {
        b.iter(|| sanitizer.sanitize(std::hint::black_box(entry.clone())));
    });
}

fn benchmark_mask_value(c: &mut Criterion) {
    c.bench_function("mask_value", |b| {
        b.iter(|| mask_value(std::hint::black_box("correct-horse-battery-staple")));
    });
}

criterion_group!(
    benches,
    benchmark_sanitize_entry,
    benchmark_deep_payload,
    benchmark_mask_value
);
criterion_main!(benches);
