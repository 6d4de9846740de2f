//! Quiz and exam grading. Pure functions over domain entities.

use crate::domain::entities::{ExamQuestion, QuizQuestion};
use serde::Serialize;
use std::collections::HashMap;

/// Per-question verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub question_id: u32,
    pub given: Option<String>,
    pub expected: String,
    pub correct: bool,
    pub awarded: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizScore {
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub verdicts: Vec<Verdict>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamScore {
    /// Marks from auto-graded (objective) questions.
    pub score: u32,
    /// Marks available across objective questions.
    pub objective_total: u32,
    /// Marks held back for manual review (subjective questions).
    pub pending_marks: u32,
    pub pending_review: Vec<u32>,
    pub percentage: f64,
    pub verdicts: Vec<Verdict>,
}

/// Lowercase, trim, collapse internal whitespace.
fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `"B"`, `"b)"`, `"(b)"` and `"B."` all resolve to option index 1.
fn option_letter_index(answer: &str) -> Option<usize> {
    let letter = answer
        .trim()
        .trim_start_matches('(')
        .trim_end_matches([')', '.', ':']);
    let mut chars = letter.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_ascii_alphabetic() {
        return None;
    }
    Some((c.to_ascii_lowercase() as u8 - b'a') as usize)
}

/// Does `given` match `expected`? Accepts the option letter when `options`
/// contains the expected text.
pub fn answer_matches(given: &str, expected: &str, options: Option<&[String]>) -> bool {
    let expected_n = normalize(expected);
    if normalize(given) == expected_n {
        return true;
    }
    let Some(options) = options else {
        return false;
    };
    // The model sometimes stores the letter as the correct answer.
    if let Some(idx) = option_letter_index(expected) {
        if let Some(opt) = options.get(idx) {
            if normalize(opt) == normalize(given) {
                return true;
            }
        }
    }
    option_letter_index(given)
        .and_then(|idx| options.get(idx))
        .is_some_and(|opt| normalize(opt) == expected_n)
}

fn percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(score) / f64::from(total) * 100.0
    }
}

/// Grade a quiz. `answers` maps question id to the learner's answer; missing
/// entries count as incorrect. Sums saturate at `u32::MAX`.
pub fn grade_quiz(questions: &[QuizQuestion], answers: &HashMap<u32, String>) -> QuizScore {
    let mut score: u32 = 0;
    let mut total: u32 = 0;
    let mut verdicts = Vec::with_capacity(questions.len());

    for q in questions {
        total = total.saturating_add(q.points);
        let given = answers.get(&q.id).filter(|a| !a.trim().is_empty());
        let correct = given
            .map(|a| answer_matches(a, &q.correct_answer, q.options.as_deref()))
            .unwrap_or(false);
        let awarded = if correct { q.points } else { 0 };
        score = score.saturating_add(awarded);
        verdicts.push(Verdict {
            question_id: q.id,
            given: given.cloned(),
            expected: q.correct_answer.clone(),
            correct,
            awarded,
        });
    }

    QuizScore {
        score,
        total,
        percentage: percentage(score, total),
        verdicts,
    }
}

/// Grade the objective part of an exam. Questions without a checkable
/// `correct_answer` are listed in `pending_review`.
pub fn grade_exam(questions: &[ExamQuestion], answers: &HashMap<u32, String>) -> ExamScore {
    let mut score: u32 = 0;
    let mut objective_total: u32 = 0;
    let mut pending_marks: u32 = 0;
    let mut pending_review = Vec::new();
    let mut verdicts = Vec::new();

    for q in questions {
        let expected = match (&q.correct_answer, q.question_type.is_objective()) {
            (Some(expected), true) => expected,
            _ => {
                pending_marks = pending_marks.saturating_add(q.marks);
                pending_review.push(q.id);
                continue;
            }
        };
        objective_total = objective_total.saturating_add(q.marks);
        let given = answers.get(&q.id).filter(|a| !a.trim().is_empty());
        let correct = given
            .map(|a| answer_matches(a, expected, q.options.as_deref()))
            .unwrap_or(false);
        let awarded = if correct { q.marks } else { 0 };
        score = score.saturating_add(awarded);
        verdicts.push(Verdict {
            question_id: q.id,
            given: given.cloned(),
            expected: expected.clone(),
            correct,
            awarded,
        });
    }

    ExamScore {
        score,
        objective_total,
        pending_marks,
        pending_review,
        percentage: percentage(score, objective_total),
        verdicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Difficulty, QuestionType};

    fn mcq(id: u32, correct: &str, points: u32) -> QuizQuestion {
        QuizQuestion {
            id,
            question_type: QuestionType::MultipleChoice,
            question: format!("Question {}", id),
            options: Some(vec![
                "Mitochondria".to_string(),
                "Nucleus".to_string(),
                "Ribosome".to_string(),
            ]),
            correct_answer: correct.to_string(),
            explanation: String::new(),
            points,
        }
    }

    #[test]
    fn test_answer_matching_variants() {
        let options = vec!["Paris".to_string(), "Lyon".to_string()];
        assert!(answer_matches("  paris ", "Paris", None));
        assert!(answer_matches("A", "Paris", Some(&options)));
        assert!(answer_matches("(b)", "Lyon", Some(&options)));
        assert!(answer_matches("Lyon", "B", Some(&options)));
        assert!(!answer_matches("C", "Paris", Some(&options)));
        assert!(!answer_matches("A", "Paris", None));
    }

    #[test]
    fn test_grade_quiz() {
        let questions = vec![mcq(1, "Nucleus", 2), mcq(2, "Ribosome", 1), mcq(3, "Mitochondria", 1)];
        let answers = HashMap::from([(1, "nucleus".to_string()), (2, "A".to_string())]);
        let result = grade_quiz(&questions, &answers);
        assert_eq!(result.score, 2);
        assert_eq!(result.total, 4);
        assert!((result.percentage - 50.0).abs() < f64::EPSILON);
        assert!(result.verdicts[0].correct);
        assert!(!result.verdicts[1].correct);
        assert_eq!(result.verdicts[2].given, None);
    }

    #[test]
    fn test_grade_huge_points_saturate() {
        let questions = vec![mcq(1, "Nucleus", 4_000_000_000), mcq(2, "Ribosome", 4_000_000_000)];
        let answers = HashMap::from([(1, "Nucleus".to_string()), (2, "Ribosome".to_string())]);
        let result = grade_quiz(&questions, &answers);
        assert_eq!(result.total, u32::MAX);
        assert_eq!(result.score, u32::MAX);
        assert!((result.percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grade_empty_quiz() {
        let result = grade_quiz(&[], &HashMap::new());
        assert_eq!(result.total, 0);
        assert_eq!(result.percentage, 0.0);
    }

    #[test]
    fn test_grade_exam_separates_subjective() {
        let questions = vec![
            ExamQuestion {
                id: 1,
                question: "True or false: the heart has four chambers.".into(),
                question_type: QuestionType::TrueFalse,
                marks: 2,
                options: None,
                correct_answer: Some("True".into()),
                sample_answer: None,
                difficulty: Difficulty::Easy,
                topic: "anatomy".into(),
            },
            ExamQuestion {
                id: 2,
                question: "Explain pulmonary circulation.".into(),
                question_type: QuestionType::LongAnswer,
                marks: 10,
                options: None,
                correct_answer: None,
                sample_answer: Some("Blood flows...".into()),
                difficulty: Difficulty::Hard,
                topic: "anatomy".into(),
            },
        ];
        let answers = HashMap::from([(1, "true".to_string()), (2, "It goes to the lungs".to_string())]);
        let result = grade_exam(&questions, &answers);
        assert_eq!(result.score, 2);
        assert_eq!(result.objective_total, 2);
        assert_eq!(result.pending_marks, 10);
        assert_eq!(result.pending_review, vec![2]);
        assert!((result.percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grade_exam_huge_marks_saturate() {
        let question = |id: u32, question_type: QuestionType, correct: Option<&str>| ExamQuestion {
            id,
            question: format!("Question {}", id),
            question_type,
            marks: u32::MAX,
            options: None,
            correct_answer: correct.map(str::to_string),
            sample_answer: None,
            difficulty: Difficulty::Medium,
            topic: "anatomy".into(),
        };
        let questions = vec![
            question(1, QuestionType::TrueFalse, Some("True")),
            question(2, QuestionType::TrueFalse, Some("False")),
            question(3, QuestionType::LongAnswer, None),
            question(4, QuestionType::LongAnswer, None),
        ];
        let answers = HashMap::from([(1, "True".to_string()), (2, "False".to_string())]);
        let result = grade_exam(&questions, &answers);
        assert_eq!(result.score, u32::MAX);
        assert_eq!(result.objective_total, u32::MAX);
        assert_eq!(result.pending_marks, u32::MAX);
    }
}
