//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/DB types here. Adapters map into these.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of generated study material. Also the discriminator stored with each set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyKind {
    Summary,
    Flashcards,
    Quiz,
    Exam,
    Pyq,
}

impl StudyKind {
    pub const ALL: [StudyKind; 5] = [
        StudyKind::Summary,
        StudyKind::Flashcards,
        StudyKind::Quiz,
        StudyKind::Exam,
        StudyKind::Pyq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudyKind::Summary => "summary",
            StudyKind::Flashcards => "flashcards",
            StudyKind::Quiz => "quiz",
            StudyKind::Exam => "exam",
            StudyKind::Pyq => "pyq",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for StudyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single question/answer card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// Question format. Unknown strings from the model land in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    LongAnswer,
    #[serde(other)]
    Other,
}

impl QuestionType {
    /// Objective questions have a single checkable answer.
    pub fn is_objective(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }
}

/// Unrecognised labels read as `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "Easy", alias = "EASY")]
    Easy,
    #[serde(alias = "Hard", alias = "HARD")]
    Hard,
    #[serde(other)]
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    pub explanation: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamQuestion {
    pub id: u32,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub marks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_answer: Option<String>,
    pub difficulty: Difficulty,
    pub topic: String,
}

/// Past-year question surfaced by a PYQ search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyqEntry {
    pub question: String,
    pub year: String,
    pub exam: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_hint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// A persisted generation result. `payload` is the recovered JSON, stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySet {
    pub id: String,
    pub kind: StudyKind,
    pub topic: String,
    pub payload: serde_json::Value,
    pub used_fallback: bool,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

impl StudySet {
    pub fn new(
        kind: StudyKind,
        topic: impl Into<String>,
        payload: serde_json::Value,
        used_fallback: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            topic: topic.into(),
            payload,
            used_fallback,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Number of items in the payload (1 for object payloads).
    pub fn item_count(&self) -> usize {
        match &self.payload {
            serde_json::Value::Array(items) => items.len(),
            serde_json::Value::Null => 0,
            _ => 1,
        }
    }

    /// Decode the payload into typed records.
    pub fn items<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
