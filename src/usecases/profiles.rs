//! Recovery configuration per generation call site: expected shape, required
//! fields, lenient defaults, and placeholder templates.

use crate::domain::recovery::{FallbackGenerator, RecoveryProfile, TemplateFallback};
use crate::usecases::prompts::truncate_chars;
use serde_json::{Value, json};

/// Longest salvaged prose used as a fallback summary.
const MAX_SALVAGED_SUMMARY_CHARS: usize = 2_000;

/// Profile plus the fallback generator that goes with it.
pub struct SiteProfile {
    pub profile: RecoveryProfile,
    pub fallback: Box<dyn FallbackGenerator + Send + Sync>,
}

pub fn flashcards(topic: &str, count: usize) -> SiteProfile {
    SiteProfile {
        profile: RecoveryProfile::array(&["question", "answer"])
            .envelope(&["flashcards", "cards"])
            .count(count),
        fallback: Box::new(TemplateFallback::new(
            json!({
                "question": "Key concept {n} from {topic}: what is it and why does it matter?",
                "answer": "Review your notes on {topic} and write this answer in your own words."
            }),
            topic,
        )),
    }
}

pub fn quiz(topic: &str, count: usize) -> SiteProfile {
    SiteProfile {
        profile: RecoveryProfile::array(&["question", "correct_answer"])
            .with_default("type", json!("multiple_choice"))
            .with_default("points", json!(1))
            .with_default("explanation", json!(""))
            .text_lists(&["options"])
            .sequential_ids("id")
            .envelope(&["questions", "quiz"])
            .count(count),
        fallback: Box::new(TemplateFallback::new(
            json!({
                "type": "true_false",
                "question": "Statement {n}: I can explain a key idea from {topic} without my notes.",
                "options": ["True", "False"],
                "correct_answer": "True",
                "explanation": "Placeholder question; the generated quiz could not be read. Try generating again.",
                "points": 1
            }),
            topic,
        )),
    }
}

pub fn exam(topic: &str, count: usize) -> SiteProfile {
    SiteProfile {
        profile: RecoveryProfile::array(&["question"])
            .with_default("type", json!("short_answer"))
            .with_default("marks", json!(5))
            .with_default("difficulty", json!("medium"))
            .with_default("topic", json!(topic))
            .text_fields(&["correct_answer", "sample_answer"])
            .text_lists(&["options"])
            .sequential_ids("id")
            .envelope(&["questions", "exam"])
            .count(count),
        fallback: Box::new(TemplateFallback::new(
            json!({
                "question": "Question {n}: Explain an important concept from {topic} with an example.",
                "type": "short_answer",
                "marks": 5,
                "sample_answer": "A complete answer defines the concept, explains it, and gives a relevant example from {topic}.",
                "difficulty": "medium",
                "topic": "{topic}"
            }),
            topic,
        )),
    }
}

pub fn pyq(query: &str, count: usize) -> SiteProfile {
    SiteProfile {
        profile: RecoveryProfile::array(&["question"])
            .with_default("year", json!("unknown"))
            .with_default("exam", json!("unknown"))
            .with_default("topic", json!(query))
            .text_fields(&["answer_hint"])
            .count_fields(&["marks"])
            .envelope(&["questions", "results", "pyqs"])
            .count(count),
        fallback: Box::new(TemplateFallback::new(
            json!({
                "question": "Practice question {n}: Describe the core ideas of {topic}.",
                "year": "unknown",
                "exam": "practice",
                "topic": "{topic}",
                "answer_hint": "No past-year questions could be retrieved; use this as a self-test."
            }),
            query,
        )),
    }
}

pub fn summary(topic: &str) -> SiteProfile {
    SiteProfile {
        profile: RecoveryProfile::object(&["summary"])
            .with_default("key_points", json!([]))
            .text_lists(&["key_points"]),
        fallback: Box::new(SummaryFallback {
            topic: topic.to_string(),
        }),
    }
}

/// Summary placeholder. A model that ignored the JSON instruction usually
/// still wrote a summary, so plain prose is kept as the summary text.
struct SummaryFallback {
    topic: String,
}

impl FallbackGenerator for SummaryFallback {
    fn item(&self, _index: usize) -> Value {
        json!({
            "summary": format!("A summary of {} could not be generated. Please try again.", self.topic),
            "key_points": []
        })
    }

    fn object(&self, raw: &str) -> Value {
        let prose = raw.trim();
        let looks_structured = prose.starts_with('{') || prose.starts_with('[') || prose.starts_with("```");
        if prose.is_empty() || looks_structured {
            return self.item(0);
        }
        json!({
            "summary": truncate_chars(prose, MAX_SALVAGED_SUMMARY_CHARS),
            "key_points": []
        })
    }
}
