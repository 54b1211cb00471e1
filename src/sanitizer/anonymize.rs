use super::CIRCULAR_SENTINEL;
use serde_json::Value;

/// Replacement for sensitive values too short to partially reveal.
pub const SHORT_VALUE_MASK: &str = "****";

/// Masks a sensitive value, keeping only its first and last character.
///
/// Values of four characters or fewer become [`SHORT_VALUE_MASK`]. Longer
/// values keep their outer characters around `max(2, len - 2)` asterisks,
/// so their length is preserved.
pub fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return SHORT_VALUE_MASK.to_string();
    }

    let interior = (chars.len() - 2).max(2);
    let mut masked = String::with_capacity(value.len());
    masked.push(chars[0]);
    masked.extend(std::iter::repeat_n('*', interior));
    masked.push(chars[chars.len() - 1]);
    masked
}

/// Field-name driven masking over one payload sub-tree.
pub struct FieldAnonymizer<'a> {
    sensitive_fields: Vec<String>,
    max_depth: usize,
    applied: &'a mut Vec<String>,
}

impl<'a> FieldAnonymizer<'a> {
    pub fn new(sensitive_fields: &[String], max_depth: usize, applied: &'a mut Vec<String>) -> Self {
        Self {
            sensitive_fields: sensitive_fields
                .iter()
                .map(|field| field.to_lowercase())
                .filter(|field| !field.is_empty())
                .collect(),
            max_depth,
            applied,
        }
    }

    /// True when the key or its dotted path contains a sensitive substring.
    pub fn is_sensitive(&self, key: &str, path: &str) -> bool {
        let key = key.to_lowercase();
        let path = path.to_lowercase();
        self.sensitive_fields
            .iter()
            .any(|field| key.contains(field.as_str()) || path.contains(field.as_str()))
    }

    /// Walks `value`, whose dotted location is `root`.
    pub fn anonymize(&mut self, root: &str, value: &mut Value) {
        self.walk(root, value, 0);
    }

    fn walk(&mut self, path: &str, value: &mut Value, depth: usize) {
        if depth >= self.max_depth && (value.is_array() || value.is_object()) {
            *value = Value::String(CIRCULAR_SENTINEL.to_string());
            return;
        }

        match value {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    let child_path = format!("{path}.{key}");
                    if let Value::String(text) = child {
                        if self.is_sensitive(key, &child_path) {
                            *text = mask_value(text);
                            self.applied.push(format!("anonymized:{child_path}"));
                        }
                    } else {
                        self.walk(&child_path, child, depth + 1);
                    }
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    self.walk(&format!("{path}.{index}"), item, depth + 1);
                }
            }
            _ => {}
        }
    }
}
