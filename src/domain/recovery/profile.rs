//! Per-call-site recovery configuration.

use serde_json::{Map, Value};

/// Expected top-level shape of a model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `[ {...}, {...} ]`
    Array,
    /// `{ ... }`
    Object,
}

impl Shape {
    pub fn open(&self) -> char {
        match self {
            Shape::Array => '[',
            Shape::Object => '{',
        }
    }

    pub fn close(&self) -> char {
        match self {
            Shape::Array => ']',
            Shape::Object => '}',
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Shape::Array => value.is_array(),
            Shape::Object => value.is_object(),
        }
    }
}

/// What a call site expects back and how lenient to be about it.
///
/// Built with the chained constructors:
///
/// ```
/// use serde_json::json;
/// use studyforge::domain::recovery::RecoveryProfile;
///
/// let profile = RecoveryProfile::array(&["question", "correct_answer"])
///     .with_default("points", json!(1))
///     .sequential_ids("id")
///     .count(5);
/// assert_eq!(profile.requested, 5);
/// ```
#[derive(Debug, Clone)]
pub struct RecoveryProfile {
    pub shape: Shape,
    /// Fields every element must carry as a non-empty string.
    pub required: Vec<String>,
    /// Inserted when an optional field is missing, null, or of the wrong type.
    pub defaults: Map<String, Value>,
    /// Number of placeholder items synthesized on total failure.
    pub requested: usize,
    /// Array results are truncated to this many elements.
    pub max_items: usize,
    /// Optional string fields; numbers and bools are stringified, anything
    /// else non-string is removed.
    pub text_fields: Vec<String>,
    /// Optional string-list fields; scalar entries are stringified, others removed.
    pub text_lists: Vec<String>,
    /// Optional non-negative integer fields without a default; coerced or removed.
    pub count_fields: Vec<String>,
    /// Field filled with the 1-based position when missing or invalid. All
    /// elements are renumbered when ids repeat.
    pub id_field: Option<String>,
    /// Object keys that may wrap the expected array (`{"questions": [...]}`).
    pub envelope_keys: Vec<String>,
}

impl RecoveryProfile {
    fn new(shape: Shape, required: &[&str]) -> Self {
        Self {
            shape,
            required: required.iter().map(|s| s.to_string()).collect(),
            defaults: Map::new(),
            requested: 1,
            max_items: usize::MAX,
            text_fields: Vec::new(),
            text_lists: Vec::new(),
            count_fields: Vec::new(),
            id_field: None,
            envelope_keys: Vec::new(),
        }
    }

    pub fn array(required: &[&str]) -> Self {
        Self::new(Shape::Array, required)
    }

    pub fn object(required: &[&str]) -> Self {
        Self::new(Shape::Object, required)
    }

    pub fn with_default(mut self, field: &str, value: Value) -> Self {
        self.defaults.insert(field.to_string(), value);
        self
    }

    /// Sets both the placeholder count and the truncation limit.
    pub fn count(mut self, n: usize) -> Self {
        self.requested = n.max(1);
        self.max_items = n.max(1);
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = n.max(1);
        self
    }

    pub fn text_fields(mut self, fields: &[&str]) -> Self {
        self.text_fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn text_lists(mut self, fields: &[&str]) -> Self {
        self.text_lists = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn count_fields(mut self, fields: &[&str]) -> Self {
        self.count_fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn sequential_ids(mut self, field: &str) -> Self {
        self.id_field = Some(field.to_string());
        self
    }

    pub fn envelope(mut self, keys: &[&str]) -> Self {
        self.envelope_keys = keys.iter().map(|s| s.to_string()).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_sets_requested_and_limit() {
        let p = RecoveryProfile::array(&["question"]).count(0);
        assert_eq!(p.requested, 1);
        assert_eq!(p.max_items, 1);

        let p = RecoveryProfile::array(&["question"]).count(4).max_items(10);
        assert_eq!(p.requested, 4);
        assert_eq!(p.max_items, 10);
    }

    #[test]
    fn test_shape_matches() {
        assert!(Shape::Array.matches(&json!([])));
        assert!(!Shape::Array.matches(&json!({})));
        assert!(Shape::Object.matches(&json!({})));
        assert!(!Shape::Object.matches(&json!("text")));
    }
}
