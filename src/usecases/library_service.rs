//! Library service. Browsing, grading and exporting stored study sets.
//!
//! Exports are written under `exports_dir`; the directory is created on demand.

use crate::adapters::export::{flashcards_to_csv, render_markdown};
use crate::domain::grading;
use crate::domain::{
    DomainError, ExamQuestion, ExamScore, Flashcard, QuizQuestion, QuizScore, StudyKind, StudySet,
};
use crate::ports::StudyRepoPort;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::info;

pub struct LibraryService {
    repo: Arc<dyn StudyRepoPort>,
    exports_dir: PathBuf,
}

impl LibraryService {
    /// Create a new library service.
    ///
    /// # Arguments
    /// * `repo` - Study set store
    /// * `exports_dir` - Directory for CSV and Markdown exports
    pub fn new(repo: Arc<dyn StudyRepoPort>, exports_dir: PathBuf) -> Self {
        Self { repo, exports_dir }
    }

    pub fn exports_dir(&self) -> &Path {
        &self.exports_dir
    }

    /// Newest sets first, optionally filtered by kind.
    pub async fn list_sets(
        &self,
        kind: Option<StudyKind>,
        limit: u32,
    ) -> Result<Vec<StudySet>, DomainError> {
        self.repo.list_sets(kind, limit).await
    }

    pub async fn get_set(&self, id: &str) -> Result<StudySet, DomainError> {
        self.repo
            .get_set(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("study set {}", id)))
    }

    pub async fn grade_quiz(
        &self,
        set_id: &str,
        answers: &HashMap<u32, String>,
    ) -> Result<QuizScore, DomainError> {
        let set = self.get_kind(set_id, StudyKind::Quiz).await?;
        let questions: Vec<QuizQuestion> = decode(&set)?;
        let result = grading::grade_quiz(&questions, answers);
        info!(set_id, score = result.score, total = result.total, "quiz graded");
        Ok(result)
    }

    pub async fn grade_exam(
        &self,
        set_id: &str,
        answers: &HashMap<u32, String>,
    ) -> Result<ExamScore, DomainError> {
        let set = self.get_kind(set_id, StudyKind::Exam).await?;
        let questions: Vec<ExamQuestion> = decode(&set)?;
        let result = grading::grade_exam(&questions, answers);
        info!(
            set_id,
            score = result.score,
            objective_total = result.objective_total,
            pending = result.pending_review.len(),
            "exam graded"
        );
        Ok(result)
    }

    /// Write a flashcard set as Anki-importable CSV. Returns the file path.
    pub async fn export_flashcards_csv(&self, set_id: &str) -> Result<PathBuf, DomainError> {
        let set = self.get_kind(set_id, StudyKind::Flashcards).await?;
        let cards: Vec<Flashcard> = decode(&set)?;
        let body = flashcards_to_csv(&cards)
            .map_err(|e| DomainError::Export(format!("Failed to build CSV: {}", e)))?;
        self.write_export(&set, "csv", body).await
    }

    /// Write any study set as Markdown. Returns the file path.
    pub async fn export_markdown(&self, set_id: &str) -> Result<PathBuf, DomainError> {
        let set = self.get_set(set_id).await?;
        let body = render_markdown(&set)?;
        self.write_export(&set, "md", body).await
    }

    async fn get_kind(&self, set_id: &str, kind: StudyKind) -> Result<StudySet, DomainError> {
        let set = self.get_set(set_id).await?;
        if set.kind != kind {
            return Err(DomainError::Validation(format!(
                "set {} is a {} set, expected {}",
                set_id, set.kind, kind
            )));
        }
        Ok(set)
    }

    async fn write_export(
        &self,
        set: &StudySet,
        extension: &str,
        body: String,
    ) -> Result<PathBuf, DomainError> {
        fs::create_dir_all(&self.exports_dir)
            .await
            .map_err(|e| DomainError::Export(format!("Failed to create exports dir: {}", e)))?;

        let short_id: String = set.id.chars().take(8).collect();
        let path = self
            .exports_dir
            .join(format!("{}_{}_{}.{}", set.kind, slug(&set.topic), short_id, extension));

        fs::write(&path, body)
            .await
            .map_err(|e| DomainError::Export(format!("Failed to write {}: {}", path.display(), e)))?;

        info!(path = %path.display(), "export written");
        Ok(path)
    }
}

fn decode<T: serde::de::DeserializeOwned>(set: &StudySet) -> Result<T, DomainError> {
    set.items::<T>()
        .map_err(|e| DomainError::Repo(format!("set {} has unexpected payload: {}", set.id, e)))
}

/// Filename-safe topic: lowercase alphanumerics joined by `-`, at most 40 chars.
fn slug(topic: &str) -> String {
    let mut out = String::new();
    for word in topic
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !out.is_empty() {
            out.push('-');
        }
        out.push_str(&word.to_lowercase());
    }
    let out: String = out.chars().take(40).collect();
    if out.is_empty() { "set".to_string() } else { out }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::MemoryRepo;
    use serde_json::json;

    async fn library_with(sets: &[StudySet]) -> (tempfile::TempDir, LibraryService) {
        let repo = Arc::new(MemoryRepo::new());
        for set in sets {
            repo.save_set(set).await.unwrap();
        }
        let dir = tempfile::tempdir().unwrap();
        let svc = LibraryService::new(repo, dir.path().join("exports"));
        (dir, svc)
    }

    fn quiz_set() -> StudySet {
        StudySet::new(
            StudyKind::Quiz,
            "Cell Biology",
            json!([
                {"id": 1, "type": "multiple_choice", "question": "Powerhouse?", "options": ["Nucleus", "Mitochondria"],
                 "correct_answer": "Mitochondria", "explanation": "", "points": 2},
                {"id": 2, "type": "true_false", "question": "Cells have walls.", "options": ["True", "False"],
                 "correct_answer": "False", "explanation": "", "points": 1}
            ]),
            false,
        )
    }

    #[tokio::test]
    async fn test_get_missing_set() {
        let (_dir, svc) = library_with(&[]).await;
        assert!(matches!(svc.get_set("nope").await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_grade_quiz_by_set_id() {
        let set = quiz_set();
        let (_dir, svc) = library_with(std::slice::from_ref(&set)).await;
        let answers = HashMap::from([(1, "B".to_string()), (2, "true".to_string())]);
        let result = svc.grade_quiz(&set.id, &answers).await.unwrap();
        assert_eq!(result.score, 2);
        assert_eq!(result.total, 3);
    }

    #[tokio::test]
    async fn test_grade_rejects_wrong_kind() {
        let set = quiz_set();
        let (_dir, svc) = library_with(std::slice::from_ref(&set)).await;
        assert!(matches!(
            svc.grade_exam(&set.id, &HashMap::new()).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            svc.export_flashcards_csv(&set.id).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_exports_written_to_disk() {
        let deck = StudySet::new(
            StudyKind::Flashcards,
            "Cell Biology",
            json!([{"question": "What is ATP?", "answer": "Energy currency"}]),
            false,
        );
        let quiz = quiz_set();
        let (_dir, svc) = library_with(&[deck.clone(), quiz.clone()]).await;

        let csv_path = svc.export_flashcards_csv(&deck.id).await.unwrap();
        assert_eq!(csv_path.extension().and_then(|e| e.to_str()), Some("csv"));
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv.contains("What is ATP?;Energy currency"));

        let md_path = svc.export_markdown(&quiz.id).await.unwrap();
        assert!(md_path.starts_with(svc.exports_dir()));
        assert!(md_path.to_string_lossy().contains("quiz_cell-biology_"));
        let md = std::fs::read_to_string(&md_path).unwrap();
        assert!(md.contains("## Answer Key"));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Cell Biology: Part 2!"), "cell-biology-part-2");
        assert_eq!(slug("  ?? "), "set");
    }
}
