//! Prompt builders for each generation task.
//!
//! Every structured task instructs the model to emit pure JSON; the recovery
//! parser handles the cases where it does not.

/// Documents longer than this are cut before being sent (roughly 6k tokens).
pub const MAX_CONTEXT_CHARS: usize = 24_000;

/// Cut `text` to at most `max` chars on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

const JSON_ONLY: &str = "Respond with valid JSON only. No markdown fences, no commentary before or after the JSON.";

pub fn summary_system() -> String {
    format!(
        r#"You are a study assistant who writes clear, faithful summaries of student notes.

## Output Format
{}

{{
  "summary": "Two or three short paragraphs covering the main ideas.",
  "key_points": ["point 1", "point 2", "point 3"]
}}

Use 3-7 key points. Do not invent facts that are not in the notes."#,
        JSON_ONLY
    )
}

pub fn flashcards_system(count: usize) -> String {
    format!(
        r#"You are a study assistant who turns notes into flashcards for active recall.

## Rules
- Create exactly {count} flashcards.
- Each question tests one fact or concept from the notes.
- Answers are short (one or two sentences).

## Output Format
{json_only}

[
  {{"question": "What is ...?", "answer": "..."}}
]"#,
        count = count,
        json_only = JSON_ONLY
    )
}

pub fn quiz_system(count: usize) -> String {
    format!(
        r#"You are a study assistant who writes quizzes from student notes.

## Rules
- Create exactly {count} questions.
- Use "multiple_choice" (four options) or "true_false" (options "True" and "False").
- "correct_answer" must be the exact text of one option.
- Give a one-sentence explanation and a point value (1-3).

## Output Format
{json_only}

[
  {{
    "id": 1,
    "type": "multiple_choice",
    "question": "...",
    "options": ["...", "...", "...", "..."],
    "correct_answer": "...",
    "explanation": "...",
    "points": 1
  }}
]"#,
        count = count,
        json_only = JSON_ONLY
    )
}

pub fn exam_system(count: usize, topic: &str) -> String {
    format!(
        r#"You are an examiner writing a practice exam on "{topic}" from student notes.

## Rules
- Create exactly {count} questions with a mix of difficulties.
- "type" is one of "multiple_choice", "true_false", "short_answer", "long_answer".
- Objective questions include "options" and "correct_answer".
- Written questions include a "sample_answer" a grader can mark against.
- "marks" reflects effort: 1-2 objective, 3-5 short answer, 8-15 long answer.

## Output Format
{json_only}

[
  {{
    "id": 1,
    "question": "...",
    "type": "short_answer",
    "marks": 5,
    "sample_answer": "...",
    "difficulty": "easy|medium|hard",
    "topic": "{topic}"
  }}
]"#,
        count = count,
        topic = topic,
        json_only = JSON_ONLY
    )
}

pub fn pyq_system(count: usize) -> String {
    format!(
        r#"You are an exam-preparation assistant with knowledge of past university and competitive exam papers.

## Rules
- List up to {count} past-year questions relevant to the student's query.
- Only include questions you are reasonably confident appeared in a real paper.
- Use "unknown" for the year or exam when unsure.

## Output Format
{json_only}

[
  {{
    "question": "...",
    "year": "2021",
    "exam": "Exam or board name",
    "topic": "...",
    "marks": 5,
    "answer_hint": "One line on how to approach it"
  }}
]"#,
        count = count,
        json_only = JSON_ONLY
    )
}

/// User prompt carrying the (possibly truncated) notes.
pub fn document_user(topic: &str, text: &str) -> String {
    let body = truncate_chars(text, MAX_CONTEXT_CHARS);
    let note = if body.len() < text.len() {
        "\n\n[Notes truncated]"
    } else {
        ""
    };
    format!("Topic: {}\n\nNotes:\n{}{}", topic, body, note)
}

pub fn pyq_user(query: &str) -> String {
    format!("Find past-year exam questions for: {}", query.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_document_user_marks_truncation() {
        let long = "x".repeat(MAX_CONTEXT_CHARS + 10);
        let prompt = document_user("Algebra", &long);
        assert!(prompt.starts_with("Topic: Algebra"));
        assert!(prompt.ends_with("[Notes truncated]"));
        assert!(!document_user("Algebra", "short notes").contains("truncated"));
    }

    #[test]
    fn test_system_prompts_embed_count() {
        assert!(flashcards_system(7).contains("exactly 7 flashcards"));
        assert!(quiz_system(3).contains("exactly 3 questions"));
        assert!(exam_system(4, "Optics").contains("\"topic\": \"Optics\""));
        assert!(summary_system().contains("\"key_points\""));
    }
}
