//! Markdown rendering of study sets for reading and printing.

use crate::domain::{
    DomainError, ExamQuestion, Flashcard, PyqEntry, QuizQuestion, StudyKind, StudySet, Summary,
};
use chrono::{DateTime, Utc};
use std::fmt::Write;

fn decode<T: serde::de::DeserializeOwned>(set: &StudySet) -> Result<T, DomainError> {
    set.items::<T>()
        .map_err(|e| DomainError::Export(format!("set {} has unexpected payload: {}", set.id, e)))
}

fn option_label(i: usize) -> char {
    (b'A' + (i % 26) as u8) as char
}

/// Render a study set as a Markdown document.
pub fn render_markdown(set: &StudySet) -> Result<String, DomainError> {
    let timestamp = DateTime::<Utc>::from_timestamp(set.created_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let title = match set.kind {
        StudyKind::Summary => "Summary",
        StudyKind::Flashcards => "Flashcards",
        StudyKind::Quiz => "Quiz",
        StudyKind::Exam => "Practice Exam",
        StudyKind::Pyq => "Past-Year Questions",
    };

    let mut md = String::new();

    // Header
    let _ = writeln!(md, "# {}: {}\n", title, set.topic);
    let _ = writeln!(md, "**Set:** `{}` | **Created:** {}\n", set.id, timestamp);
    if set.used_fallback {
        md.push_str("> The assistant's response could not be read; this set contains placeholder content.\n\n");
    }
    md.push_str("---\n\n");

    match set.kind {
        StudyKind::Summary => {
            let summary: Summary = decode(set)?;
            md.push_str(&summary.summary);
            md.push_str("\n\n");
            if !summary.key_points.is_empty() {
                md.push_str("## Key Points\n\n");
                for point in &summary.key_points {
                    let _ = writeln!(md, "- {}", point);
                }
                md.push('\n');
            }
        }
        StudyKind::Flashcards => {
            let cards: Vec<Flashcard> = decode(set)?;
            for (i, card) in cards.iter().enumerate() {
                let _ = writeln!(md, "### Card {}\n", i + 1);
                let _ = writeln!(md, "**Q:** {}\n", card.question);
                let _ = writeln!(md, "**A:** {}\n", card.answer);
            }
        }
        StudyKind::Quiz => {
            let questions: Vec<QuizQuestion> = decode(set)?;
            let total: u32 = questions.iter().map(|q| q.points).sum();
            let _ = writeln!(md, "*{} questions, {} points*\n", questions.len(), total);
            for q in &questions {
                let _ = writeln!(md, "### {}. {} ({} pt)\n", q.id, q.question, q.points);
                if let Some(options) = &q.options {
                    for (i, opt) in options.iter().enumerate() {
                        let _ = writeln!(md, "- {}) {}", option_label(i), opt);
                    }
                    md.push('\n');
                }
            }
            md.push_str("## Answer Key\n\n");
            for q in &questions {
                let _ = write!(md, "- **{}.** {}", q.id, q.correct_answer);
                if !q.explanation.trim().is_empty() {
                    let _ = write!(md, " - {}", q.explanation.trim());
                }
                md.push('\n');
            }
            md.push('\n');
        }
        StudyKind::Exam => {
            let questions: Vec<ExamQuestion> = decode(set)?;
            let total: u32 = questions.iter().map(|q| q.marks).sum();
            let _ = writeln!(md, "*{} questions, {} marks*\n", questions.len(), total);
            for q in &questions {
                let _ = writeln!(
                    md,
                    "### {}. {} [{} marks, {:?}]\n",
                    q.id, q.question, q.marks, q.difficulty
                );
                if let Some(options) = &q.options {
                    for (i, opt) in options.iter().enumerate() {
                        let _ = writeln!(md, "- {}) {}", option_label(i), opt);
                    }
                    md.push('\n');
                }
                if let Some(answer) = q.correct_answer.as_ref().or(q.sample_answer.as_ref()) {
                    let _ = writeln!(md, "<details><summary>Answer</summary>\n\n{}\n\n</details>\n", answer);
                }
            }
        }
        StudyKind::Pyq => {
            let entries: Vec<PyqEntry> = decode(set)?;
            for (i, entry) in entries.iter().enumerate() {
                let _ = write!(md, "{}. {} *({}, {})*", i + 1, entry.question, entry.exam, entry.year);
                if let Some(marks) = entry.marks {
                    let _ = write!(md, " [{} marks]", marks);
                }
                md.push('\n');
                if let Some(hint) = &entry.answer_hint {
                    let _ = writeln!(md, "   - Hint: {}", hint);
                }
            }
            md.push('\n');
        }
    }

    // Footer
    md.push_str("---\n");
    md.push_str("*Generated by studyforge*\n");

    Ok(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_quiz_with_answer_key() {
        let set = StudySet::new(
            StudyKind::Quiz,
            "Cells",
            json!([{
                "id": 1, "type": "multiple_choice", "question": "Powerhouse of the cell?",
                "options": ["Nucleus", "Mitochondria"], "correct_answer": "Mitochondria",
                "explanation": "It produces ATP.", "points": 1
            }]),
            false,
        );
        let md = render_markdown(&set).unwrap();
        assert!(md.starts_with("# Quiz: Cells"));
        assert!(md.contains("- B) Mitochondria"));
        assert!(md.contains("## Answer Key"));
        assert!(md.contains("It produces ATP."));
        assert!(!md.contains("placeholder content"));
    }

    #[test]
    fn test_render_marks_fallback_sets() {
        let set = StudySet::new(
            StudyKind::Flashcards,
            "Cells",
            json!([{"question": "Q1", "answer": "A1"}]),
            true,
        );
        let md = render_markdown(&set).unwrap();
        assert!(md.contains("placeholder content"));
        assert!(md.contains("**Q:** Q1"));
    }

    #[test]
    fn test_render_rejects_mismatched_payload() {
        let set = StudySet::new(StudyKind::Summary, "x", json!([1, 2]), false);
        assert!(matches!(render_markdown(&set), Err(DomainError::Export(_))));
    }
}
