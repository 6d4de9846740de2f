//! Post-parse validation: shape check, element filtering, default coercion.

use super::profile::{RecoveryProfile, Shape};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Upper bound for integer fields; record counts and ids are `u32`.
const MAX_COUNT: u64 = u32::MAX as u64;

/// Accept `value` if it has the expected shape, unwrapping a configured
/// envelope object when an array is expected.
pub(crate) fn conform_shape(value: Value, profile: &RecoveryProfile) -> Option<Value> {
    if profile.shape.matches(&value) {
        return Some(value);
    }
    if profile.shape == Shape::Array {
        if let Value::Object(mut map) = value {
            for key in &profile.envelope_keys {
                if let Some(inner @ Value::Array(_)) = map.remove(key) {
                    return Some(inner);
                }
            }
        }
    }
    None
}

/// Outcome of validating a shaped value.
pub(crate) struct Validated {
    pub value: Option<Value>,
    pub dropped: usize,
}

/// Filter and normalize a shaped value. `value` is `None` when nothing usable
/// is left (empty array after filtering, or object missing required fields).
pub(crate) fn validate(value: Value, profile: &RecoveryProfile) -> Validated {
    match value {
        Value::Array(items) => {
            let mut kept = Vec::with_capacity(items.len().min(profile.max_items));
            // Elements past the limit are truncated, not counted as dropped.
            let mut examined = 0usize;
            for item in items {
                if kept.len() >= profile.max_items {
                    break;
                }
                examined += 1;
                let Value::Object(map) = item else { continue };
                if let Some(map) = normalize_item(map, profile, kept.len() + 1) {
                    kept.push(Value::Object(map));
                }
            }
            if let Some(id_field) = &profile.id_field {
                renumber_repeated_ids(&mut kept, id_field);
            }
            let dropped = examined - kept.len();
            Validated {
                value: if kept.is_empty() {
                    None
                } else {
                    Some(Value::Array(kept))
                },
                dropped,
            }
        }
        Value::Object(map) => match normalize_item(map, profile, 1) {
            Some(map) => Validated {
                value: Some(Value::Object(map)),
                dropped: 0,
            },
            None => Validated {
                value: None,
                dropped: 1,
            },
        },
        _ => Validated {
            value: None,
            dropped: 0,
        },
    }
}

/// Check required fields and coerce optional ones. Returns `None` when a
/// required field is missing or blank.
pub(crate) fn normalize_item(
    mut map: Map<String, Value>,
    profile: &RecoveryProfile,
    position: usize,
) -> Option<Map<String, Value>> {
    for field in &profile.required {
        let text = match map.get(field) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => return None,
        };
        if text.is_empty() {
            return None;
        }
        if !map.get(field).is_some_and(Value::is_string) {
            map.insert(field.clone(), Value::String(text));
        }
    }

    for (field, default) in &profile.defaults {
        let coerced = match map.get(field) {
            None | Some(Value::Null) => Some(default.clone()),
            Some(current) => coerce_like(current, default),
        };
        if let Some(v) = coerced {
            map.insert(field.clone(), v);
        }
    }

    for field in &profile.text_fields {
        let text = match map.get(field) {
            None | Some(Value::String(_)) => continue,
            Some(other) => as_text(other),
        };
        match text {
            Some(text) => map.insert(field.clone(), Value::String(text)),
            None => map.remove(field),
        };
    }

    for field in &profile.text_lists {
        let list = match map.get(field) {
            None => continue,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(as_text)
                    .map(Value::String)
                    .collect::<Vec<_>>(),
            ),
            Some(_) => None,
        };
        match list {
            Some(list) => map.insert(field.clone(), Value::Array(list)),
            None => map.remove(field),
        };
    }

    for field in &profile.count_fields {
        let count = match map.get(field) {
            None => continue,
            Some(v) => as_count(v),
        };
        match count {
            Some(n) => map.insert(field.clone(), Value::from(n)),
            None => map.remove(field),
        };
    }

    if let Some(id_field) = &profile.id_field {
        let valid = map
            .get(id_field)
            .and_then(Value::as_u64)
            .is_some_and(|id| id <= MAX_COUNT);
        if !valid {
            map.insert(id_field.clone(), Value::from(position as u64));
        }
    }

    Some(map)
}

/// Renumber every element from 1 when any id repeats.
fn renumber_repeated_ids(items: &mut [Value], id_field: &str) {
    let mut seen = HashSet::new();
    if items
        .iter()
        .all(|item| seen.insert(item.get(id_field).and_then(Value::as_u64)))
    {
        return;
    }
    for (i, item) in items.iter_mut().enumerate() {
        if let Value::Object(map) = item {
            map.insert(id_field.to_string(), Value::from(i as u64 + 1));
        }
    }
}

/// Scalar as text. Arrays, objects and null have no text form.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Non-negative integer reading of a number or numeric string, rounded and
/// clamped to `MAX_COUNT`.
fn as_count(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => match n.as_u64() {
            Some(u) => return Some(u.min(MAX_COUNT)),
            None => n.as_f64()?,
        },
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() && n >= 0.0 {
        Some((n.round() as u64).min(MAX_COUNT))
    } else {
        None
    }
}

/// Returns a replacement when `current` does not fit the default's type:
/// integer defaults take any non-negative number or numeric string (rounded,
/// clamped), string defaults take numbers and bools as text, anything else
/// falls back to the default. `None` means keep `current`.
fn coerce_like(current: &Value, default: &Value) -> Option<Value> {
    if default.is_u64() {
        return match as_count(current) {
            Some(n) if current.as_u64() == Some(n) => None,
            Some(n) => Some(Value::from(n)),
            None => Some(default.clone()),
        };
    }
    match (default, current) {
        (Value::String(_), Value::String(_))
        | (Value::Number(_), Value::Number(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Array(_), Value::Array(_))
        | (Value::Object(_), Value::Object(_)) => None,
        (Value::Number(_), Value::String(s)) => Some(
            s.trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| default.clone()),
        ),
        (Value::String(_), Value::Number(_) | Value::Bool(_)) => as_text(current).map(Value::String),
        _ => Some(default.clone()),
    }
}
