// Build-time validation of the built-in redaction rule table
use regex::Regex;
use std::fs::File;
use std::io::Write;

/// (name, pattern, replacement, description, severity, category)
type RuleRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
);

// Order is significant: rules run top to bottom on every string leaf.
const BUILTIN_RULES: &[RuleRow] = &[
    (
        "email",
        r#"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"#,
        "[EMAIL_REDACTED]",
        "Email addresses",
        "High",
        "Pii",
    ),
    (
        "ssn",
        r#"\b\d{3}-\d{2}-\d{4}\b"#,
        "[SSN_REDACTED]",
        "US Social Security numbers",
        "Critical",
        "Pii",
    ),
    (
        "credit_card",
        r#"\b(?:\d{4}[- ]?){3}\d{4}\b"#,
        "[CARD_REDACTED]",
        "Credit card numbers",
        "Critical",
        "Financial",
    ),
    (
        "jwt",
        r#"\beyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+"#,
        "[JWT_REDACTED]",
        "JSON Web Tokens",
        "High",
        "Credentials",
    ),
    (
        "bearer_token",
        r#"(?i)\bbearer\s+[A-Za-z0-9._~+/-]+=*"#,
        "Bearer [TOKEN_REDACTED]",
        "Bearer authorization tokens",
        "High",
        "Credentials",
    ),
    (
        "aws_access_key",
        r#"\bAKIA[0-9A-Z]{16}\b"#,
        "[AWS_KEY_REDACTED]",
        "AWS access key ids",
        "Critical",
        "Credentials",
    ),
    (
        "secret_assignment",
        r#"(?i)\b(api[_-]?key|secret|password|passwd|token)\s*[:=]\s*[^\s,;&"']+"#,
        "${1}=[REDACTED]",
        "Inline secret assignments",
        "High",
        "Credentials",
    ),
    (
        "phone",
        r#"\(?\b\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b"#,
        "[PHONE_REDACTED]",
        "Phone numbers",
        "Medium",
        "Pii",
    ),
    (
        "ipv4",
        r#"\b(?:\d{1,3}\.){3}\d{1,3}\b"#,
        "[IP_REDACTED]",
        "IPv4 addresses",
        "Low",
        "Network",
    ),
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let mut invalid = Vec::new();
    for &(name, pattern, ..) in BUILTIN_RULES {
        if let Err(e) = Regex::new(pattern) {
            invalid.push(format!("  - '{name}': {e} (pattern: {pattern})"));
        }
    }

    if !invalid.is_empty() {
        panic!(
            "Build failed due to invalid redaction patterns:\n{}",
            invalid.join("\n")
        );
    }

    if let Err(e) = generate_rule_table(BUILTIN_RULES) {
        panic!("Failed to generate redaction rule table: {e}");
    }
}

fn generate_rule_table(rules: &[RuleRow]) -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::var("OUT_DIR")?;
    let dest_path = std::path::Path::new(&out_dir).join("builtin_rules.rs");
    let mut file = File::create(dest_path)?;

    writeln!(file, "// Auto-generated redaction rules (validated by build.rs)")?;
    writeln!(file, "pub static BUILTIN_RULE_TABLE: &[BuiltinRuleRow] = &[")?;
    for (name, pattern, replacement, description, severity, category) in rules {
        writeln!(file, "    BuiltinRuleRow {{")?;
        writeln!(file, "        name: {name:?},")?;
        writeln!(file, "        pattern: r##\"{pattern}\"##,")?;
        writeln!(file, "        replacement: {replacement:?},")?;
        writeln!(file, "        description: {description:?},")?;
        writeln!(file, "        severity: RuleSeverity::{severity},")?;
        writeln!(file, "        category: RuleCategory::{category},")?;
        writeln!(file, "    }},")?;
    }
    writeln!(file, "];")?;

    Ok(())
}
