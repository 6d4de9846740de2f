//! Core domain layer. No external I/O dependencies.
//!
//! Entities, grading rules and the recovery parser live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod grading;
pub mod recovery;

pub use entities::{
    Difficulty, ExamQuestion, Flashcard, PyqEntry, QuestionType, QuizQuestion, StudyKind,
    StudySet, Summary,
};
pub use errors::DomainError;
pub use grading::{ExamScore, QuizScore, Verdict};
