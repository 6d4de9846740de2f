//! Recovery parser. Turns raw LLM text that was supposed to be pure JSON into
//! a structurally valid value, degrading step by step instead of failing.
//!
//! Ladder (first success wins): direct parse, fence-stripped parse, boundary
//! trim to the expected brackets, regex span, balanced-bracket scan, and
//! finally a synthesized placeholder sized to the requested count.
//!
//! Nothing here returns `Err` or panics on bad input; callers always get
//! something to show.

mod fallback;
mod ladder;
mod profile;
mod validate;

pub use fallback::{FallbackGenerator, TemplateFallback};
pub use ladder::{Strategy, strip_fences};
pub use profile::{RecoveryProfile, Shape};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Result of a recovery run.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovery {
    /// True when the value came from the model output.
    pub ok: bool,
    pub value: Value,
    pub used_fallback: bool,
    pub strategy: Strategy,
    /// Elements discarded by validation.
    pub dropped: usize,
}

/// Typed view of a [`Recovery`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered<T> {
    pub value: T,
    pub used_fallback: bool,
    pub strategy: Strategy,
    pub dropped: usize,
}

/// Recover a value of `profile.shape` from `raw`.
pub fn recover(
    raw: &str,
    profile: &RecoveryProfile,
    fallback: &dyn FallbackGenerator,
) -> Recovery {
    let mut dropped = 0usize;

    for (strategy, candidate) in ladder::attempts(raw, profile.shape) {
        let Some(parsed) = ladder::parse_candidate(&candidate) else {
            debug!(?strategy, "candidate did not parse");
            continue;
        };
        let Some(shaped) = validate::conform_shape(parsed, profile) else {
            debug!(?strategy, expected = ?profile.shape, "parsed into wrong shape");
            continue;
        };
        let validated = validate::validate(shaped, profile);
        dropped = dropped.max(validated.dropped);
        match validated.value {
            Some(value) => {
                debug!(?strategy, dropped = validated.dropped, "recovered model output");
                return Recovery {
                    ok: true,
                    value,
                    used_fallback: false,
                    strategy,
                    dropped: validated.dropped,
                };
            }
            None => debug!(?strategy, "no usable elements after validation"),
        }
    }

    warn!(
        raw_len = raw.len(),
        expected = ?profile.shape,
        requested = profile.requested,
        preview = %raw.chars().take(120).collect::<String>(),
        "model output unrecoverable, synthesizing fallback"
    );
    Recovery {
        ok: false,
        value: fallback::synthesize(profile, fallback, raw),
        used_fallback: true,
        strategy: Strategy::Fallback,
        dropped,
    }
}

/// Recover an array and decode each element as `T`. Elements that do not
/// decode are dropped; if none survive, the fallback is decoded instead.
pub fn recover_items<T: DeserializeOwned>(
    raw: &str,
    profile: &RecoveryProfile,
    fallback: &dyn FallbackGenerator,
) -> Recovered<Vec<T>> {
    let recovery = recover(raw, profile, fallback);
    let (items, undecodable) = decode_items::<T>(recovery.value);

    if !items.is_empty() || recovery.used_fallback {
        if recovery.used_fallback && items.is_empty() {
            warn!("fallback template does not decode into the target type");
        }
        return Recovered {
            value: items,
            used_fallback: recovery.used_fallback,
            strategy: recovery.strategy,
            dropped: recovery.dropped + undecodable,
        };
    }

    warn!(undecodable, "no recovered element decoded, using fallback");
    let (items, _) = decode_items::<T>(fallback::synthesize(profile, fallback, raw));
    Recovered {
        value: items,
        used_fallback: true,
        strategy: Strategy::Fallback,
        dropped: recovery.dropped + undecodable,
    }
}

/// Recover an object and decode it as `T`, falling back to the synthesized
/// object and then to `T::default()`.
pub fn recover_object<T: DeserializeOwned + Default>(
    raw: &str,
    profile: &RecoveryProfile,
    fallback: &dyn FallbackGenerator,
) -> Recovered<T> {
    let recovery = recover(raw, profile, fallback);
    match serde_json::from_value::<T>(recovery.value) {
        Ok(value) => Recovered {
            value,
            used_fallback: recovery.used_fallback,
            strategy: recovery.strategy,
            dropped: recovery.dropped,
        },
        Err(e) => {
            warn!(error = %e, "recovered object does not decode, using fallback");
            let value = serde_json::from_value::<T>(fallback::synthesize(profile, fallback, raw))
                .unwrap_or_default();
            Recovered {
                value,
                used_fallback: true,
                strategy: Strategy::Fallback,
                dropped: recovery.dropped + 1,
            }
        }
    }
}

fn decode_items<T: DeserializeOwned>(value: Value) -> (Vec<T>, usize) {
    let Value::Array(elements) = value else {
        return (Vec::new(), 0);
    };
    let mut items = Vec::with_capacity(elements.len());
    let mut failed = 0usize;
    for element in elements {
        match serde_json::from_value::<T>(element) {
            Ok(item) => items.push(item),
            Err(e) => {
                debug!(error = %e, "element does not decode");
                failed += 1;
            }
        }
    }
    (items, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Card {
        question: String,
        answer: String,
    }

    fn cards(count: usize) -> (RecoveryProfile, TemplateFallback) {
        (
            RecoveryProfile::array(&["question", "answer"]).count(count),
            TemplateFallback::new(
                json!({"question": "What is key idea {n} of {topic}?", "answer": "Review {topic}."}),
                "biology",
            ),
        )
    }

    #[test]
    fn test_valid_input_returned_unchanged() {
        let (profile, fallback) = cards(5);
        let raw = r#"[{"question":"Q1","answer":"A1"},{"question":"Q2","answer":"A2"}]"#;
        let out = recover(raw, &profile, &fallback);
        assert!(out.ok);
        assert!(!out.used_fallback);
        assert_eq!(out.strategy, Strategy::Direct);
        assert_eq!(out.value, serde_json::from_str::<Value>(raw).unwrap());
    }

    #[test]
    fn test_fenced_input_matches_unwrapped() {
        let (profile, fallback) = cards(5);
        let bare = r#"[{"question":"Q1","answer":"A1"}]"#;
        let fenced = format!("```json\n{}\n```", bare);
        let a = recover(bare, &profile, &fallback);
        let b = recover(&fenced, &profile, &fallback);
        assert_eq!(a.value, b.value);
        assert_eq!(b.strategy, Strategy::FenceStripped);
    }

    #[test]
    fn test_prose_around_array() {
        let (profile, fallback) = cards(5);
        let raw = "Sure! Here are your cards:\n[{\"question\":\"Q1\",\"answer\":\"A1\"}]\nGood luck with the exam.";
        let out = recover(raw, &profile, &fallback);
        assert!(out.ok);
        assert_eq!(out.strategy, Strategy::BoundaryTrim);
        assert_eq!(out.value, json!([{"question": "Q1", "answer": "A1"}]));
    }

    #[test]
    fn test_prose_and_fence_example() {
        let (profile, fallback) = cards(5);
        let raw = "Here you go:\n```json\n[{\"question\":\"Q1\",\"answer\":\"A1\"}]\n```";
        let out = recover(raw, &profile, &fallback);
        assert!(out.ok);
        assert_eq!(out.value, json!([{"question": "Q1", "answer": "A1"}]));
    }

    #[test]
    fn test_refusal_yields_requested_placeholders() {
        let (profile, fallback) = cards(3);
        let out = recover("I cannot help with that.", &profile, &fallback);
        assert!(!out.ok);
        assert!(out.used_fallback);
        assert_eq!(out.strategy, Strategy::Fallback);
        let items = out.value.as_array().unwrap();
        assert_eq!(items.len(), 3);
        for item in items {
            assert!(!item["question"].as_str().unwrap().trim().is_empty());
            assert!(!item["answer"].as_str().unwrap().trim().is_empty());
        }
        assert_eq!(items[1]["question"], "What is key idea 2 of biology?");
    }

    #[test]
    fn test_wrong_shape_falls_back() {
        let (profile, fallback) = cards(2);
        let out = recover(r#"{"question":"Q1","answer":"A1"}"#, &profile, &fallback);
        assert!(out.used_fallback);
        assert_eq!(out.value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_bracket_mismatch_recovered_by_later_rung() {
        // A bracketed note after the array defeats the boundary trim and regex span.
        let (profile, fallback) = cards(5);
        let raw = "[{\"question\":\"Q1\",\"answer\":\"A1\"}] (see note [1]";
        let out = recover(raw, &profile, &fallback);
        assert!(out.ok);
        assert_eq!(out.strategy, Strategy::BalancedScan);
        assert_eq!(out.value, json!([{"question": "Q1", "answer": "A1"}]));
    }

    #[test]
    fn test_all_elements_invalid_falls_back() {
        let (profile, fallback) = cards(2);
        let out = recover(r#"[{"question":"","answer":"A"}]"#, &profile, &fallback);
        assert!(out.used_fallback);
        assert_eq!(out.dropped, 1);
        assert_eq!(out.value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_input_falls_back() {
        let (profile, fallback) = cards(1);
        let out = recover("", &profile, &fallback);
        assert!(out.used_fallback);
        assert_eq!(out.value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_recover_items_decodes() {
        let (profile, fallback) = cards(3);
        let out: Recovered<Vec<Card>> =
            recover_items("```\n[{\"question\":\"Q\",\"answer\":\"A\"}]\n```", &profile, &fallback);
        assert!(!out.used_fallback);
        assert_eq!(
            out.value,
            vec![Card {
                question: "Q".into(),
                answer: "A".into()
            }]
        );
    }

    #[test]
    fn test_recover_items_fallback_decodes() {
        let (profile, fallback) = cards(4);
        let out: Recovered<Vec<Card>> = recover_items("nope", &profile, &fallback);
        assert!(out.used_fallback);
        assert_eq!(out.value.len(), 4);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct ScoredCard {
        question: String,
        answer: String,
        points: u32,
    }

    fn scored_fallback() -> TemplateFallback {
        TemplateFallback::new(json!({"question": "Q{n}", "answer": "A{n}", "points": 1}), "")
    }

    #[test]
    fn test_recover_items_drops_undecodable_elements() {
        let profile = RecoveryProfile::array(&["question", "answer"]).count(5);
        let raw = r#"[{"question":"Q1","answer":"A1","points":2},{"question":"Q2","answer":"A2","points":"x"}]"#;
        let out: Recovered<Vec<ScoredCard>> = recover_items(raw, &profile, &scored_fallback());
        assert!(!out.used_fallback);
        assert_eq!(out.strategy, Strategy::Direct);
        assert_eq!(out.dropped, 1);
        assert_eq!(
            out.value,
            vec![ScoredCard {
                question: "Q1".into(),
                answer: "A1".into(),
                points: 2
            }]
        );
    }

    #[test]
    fn test_recover_items_nothing_decodes_uses_fallback() {
        let profile = RecoveryProfile::array(&["question", "answer"]).count(2);
        let raw = r#"[{"question":"Q1","answer":"A1"}]"#;
        let out: Recovered<Vec<ScoredCard>> = recover_items(raw, &profile, &scored_fallback());
        assert!(out.used_fallback);
        assert_eq!(out.strategy, Strategy::Fallback);
        assert_eq!(out.dropped, 1);
        assert_eq!(out.value.len(), 2);
        assert_eq!(out.value[1].question, "Q2");
        assert_eq!(out.value[1].points, 1);
    }

    #[derive(Debug, Deserialize, Default, PartialEq)]
    struct Digest {
        summary: String,
        #[serde(default)]
        key_points: Vec<String>,
    }

    #[test]
    fn test_recover_object_with_default_fields() {
        let profile = RecoveryProfile::object(&["summary"]).with_default("key_points", json!([]));
        let fallback = TemplateFallback::new(json!({"summary": "Summary unavailable."}), "");
        let out: Recovered<Digest> =
            recover_object("Result: {\"summary\": \"Cells divide.\"}", &profile, &fallback);
        assert!(!out.used_fallback);
        assert_eq!(out.value.summary, "Cells divide.");
        assert!(out.value.key_points.is_empty());

        let out: Recovered<Digest> = recover_object("???", &profile, &fallback);
        assert!(out.used_fallback);
        assert_eq!(out.value.summary, "Summary unavailable.");
    }
}
