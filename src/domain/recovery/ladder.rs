//! Parse-attempt ladder. Produces candidate JSON slices from raw model text,
//! cheapest first.

use super::profile::Shape;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Which rung of the ladder produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Raw text parsed as-is after trimming.
    Direct,
    /// Markdown fence markers removed.
    FenceStripped,
    /// Sliced from the first expected opener to the last matching closer.
    BoundaryTrim,
    /// First `{...}` or `[...]` span found by regex.
    RegexSpan,
    /// Bracket-balanced span found by scanning.
    BalancedScan,
    /// Nothing parsed; placeholder content was synthesized.
    Fallback,
}

static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").unwrap());
static SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}|\[.*\]").unwrap());
static TRAILING_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[\]}])").unwrap());

/// Build the ordered candidate list for `raw`. Duplicate slices are skipped so
/// each distinct text is parsed once.
pub(crate) fn attempts(raw: &str, shape: Shape) -> Vec<(Strategy, String)> {
    let mut out: Vec<(Strategy, String)> = Vec::new();
    let mut push = |strategy: Strategy, candidate: &str| {
        let candidate = candidate.trim();
        if candidate.is_empty() || out.iter().any(|(_, c)| c == candidate) {
            return;
        }
        out.push((strategy, candidate.to_string()));
    };

    let trimmed = raw.trim();
    push(Strategy::Direct, trimmed);

    let unfenced = strip_fences(trimmed);
    push(Strategy::FenceStripped, &unfenced);

    if let Some(span) = boundary_trim(&unfenced, shape) {
        push(Strategy::BoundaryTrim, span);
    }

    if let Some(m) = SPAN_RE.find(&unfenced) {
        push(Strategy::RegexSpan, m.as_str());
    }

    for span in balanced_spans(&unfenced, shape) {
        push(Strategy::BalancedScan, span);
    }

    out
}

/// Parse a candidate; on failure retry once with trailing commas removed.
pub(crate) fn parse_candidate(candidate: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(candidate) {
        return Some(v);
    }
    let repaired = TRAILING_COMMA_RE.replace_all(candidate, "$1");
    if repaired.as_ref() == candidate {
        return None;
    }
    serde_json::from_str::<Value>(&repaired).ok()
}

/// Remove every ```` ``` ```` / ```` ```json ```` marker.
pub fn strip_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").trim().to_string()
}

fn boundary_trim(text: &str, shape: Shape) -> Option<&str> {
    let start = text.find(shape.open())?;
    let end = text.rfind(shape.close())?;
    if start < end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Top-level bracket-balanced spans that open with the expected bracket.
///
/// Quotes are only tracked inside brackets, so apostrophes and quoted words in
/// surrounding prose do not throw the scanner off.
fn balanced_spans(text: &str, shape: Shape) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth: u32 = 0;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escape = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '[' | '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            ']' | '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(s) = start.take() {
                            if text[s..].starts_with(shape.open()) {
                                spans.push(&text[s..idx + ch.len_utf8()]);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategies(raw: &str, shape: Shape) -> Vec<Strategy> {
        attempts(raw, shape).into_iter().map(|(s, _)| s).collect()
    }

    #[test]
    fn test_clean_input_has_single_attempt() {
        assert_eq!(strategies(r#"[{"a":1}]"#, Shape::Array), vec![Strategy::Direct]);
    }

    #[test]
    fn test_strip_fences_with_and_without_lang() {
        assert_eq!(strip_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("no fences"), "no fences");
    }

    #[test]
    fn test_boundary_trim_uses_expected_brackets() {
        let text = r#"Result: {"note": "x"} and [1, 2]. Done."#;
        assert_eq!(boundary_trim(text, Shape::Array), Some("[1, 2]"));
        assert_eq!(boundary_trim(text, Shape::Object), Some(r#"{"note": "x"}"#));
        assert_eq!(boundary_trim("] backwards [", Shape::Array), None);
    }

    #[test]
    fn test_balanced_spans_ignore_prose_quotes() {
        let text = r#"It's "done": [{"q": "a]b"}] then {"x": 1} and [2]"#;
        let spans = balanced_spans(text, Shape::Array);
        assert_eq!(spans, vec![r#"[{"q": "a]b"}]"#, "[2]"]);
    }

    #[test]
    fn test_parse_candidate_repairs_trailing_commas() {
        let v = parse_candidate(r#"[{"a": 1,}, {"a": 2},]"#).unwrap();
        assert_eq!(v.as_array().map(|a| a.len()), Some(2));
        assert!(parse_candidate("not json").is_none());
    }

    #[test]
    fn test_prose_only_yields_single_attempt() {
        assert_eq!(
            strategies("I cannot help with that.", Shape::Array),
            vec![Strategy::Direct]
        );
    }
}
