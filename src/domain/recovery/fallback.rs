//! Fallback synthesis: deterministic placeholder content for responses that
//! could not be recovered.

use super::profile::{RecoveryProfile, Shape};
use super::validate::normalize_item;
use serde_json::{Map, Value};

/// Produces placeholder records. Implementations must be deterministic.
pub trait FallbackGenerator {
    /// Placeholder for array element `index` (0-based).
    fn item(&self, index: usize) -> Value;

    /// Placeholder for an object-shaped response. `raw` is the unparseable
    /// model text, available to generators that can salvage prose.
    fn object(&self, raw: &str) -> Value {
        let _ = raw;
        self.item(0)
    }
}

/// Template-driven generator. String values in the template may contain
/// `{n}` (1-based item number) and `{topic}`.
#[derive(Debug, Clone)]
pub struct TemplateFallback {
    template: Value,
    topic: String,
}

impl TemplateFallback {
    pub fn new(template: Value, topic: impl Into<String>) -> Self {
        Self {
            template,
            topic: topic.into(),
        }
    }

    fn render(&self, value: &Value, n: usize) -> Value {
        match value {
            Value::String(s) => Value::String(
                s.replace("{n}", &n.to_string())
                    .replace("{topic}", &self.topic),
            ),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.render(v, n)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.render(v, n)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl FallbackGenerator for TemplateFallback {
    fn item(&self, index: usize) -> Value {
        self.render(&self.template, index + 1)
    }
}

/// Build the fallback value for `profile`. Every synthesized element passes
/// the required-fields check: blanks left by the generator are filled with
/// `"<field> <n>"`.
pub(crate) fn synthesize(
    profile: &RecoveryProfile,
    generator: &dyn FallbackGenerator,
    raw: &str,
) -> Value {
    match profile.shape {
        Shape::Array => {
            let count = profile.requested.max(1);
            let items = (0..count)
                .map(|i| Value::Object(complete(generator.item(i), profile, i + 1)))
                .collect();
            Value::Array(items)
        }
        Shape::Object => Value::Object(complete(generator.object(raw), profile, 1)),
    }
}

fn complete(value: Value, profile: &RecoveryProfile, n: usize) -> Map<String, Value> {
    let mut map = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for field in &profile.required {
        let blank = match map.get(field) {
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Number(_)) | Some(Value::Bool(_)) => false,
            _ => true,
        };
        if blank {
            map.insert(field.clone(), Value::String(format!("{} {}", field, n)));
        }
    }
    // Required fields are now present, so normalization cannot reject.
    normalize_item(map.clone(), profile, n).unwrap_or(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_renders_placeholders() {
        let template = TemplateFallback::new(
            json!({"question": "Card {n}: {topic}", "tags": ["{topic}"], "points": 1}),
            "photosynthesis",
        );
        assert_eq!(
            template.item(2),
            json!({"question": "Card 3: photosynthesis", "tags": ["photosynthesis"], "points": 1})
        );
    }

    #[test]
    fn test_synthesize_sizes_to_requested_and_fills_required() {
        let profile = RecoveryProfile::array(&["question", "answer"]).count(3);
        let template = TemplateFallback::new(json!({"question": "Q{n}"}), "t");
        let value = synthesize(&profile, &template, "");
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["question"], "Q1");
        assert_eq!(items[2]["answer"], "answer 3");
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let profile = RecoveryProfile::array(&["question"])
            .sequential_ids("id")
            .count(2);
        let template = TemplateFallback::new(json!({"question": "Q{n}"}), "t");
        assert_eq!(synthesize(&profile, &template, "x"), synthesize(&profile, &template, "y"));
    }
}
