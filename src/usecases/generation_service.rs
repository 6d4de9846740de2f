//! Generation service. One method per study-material call site.
//!
//! Flow for every call: validate input -> build prompt -> AI completion ->
//! recovery parser with the site's profile -> persist -> return.
//! Provider failures degrade to placeholder content rather than errors.

use crate::domain::recovery::{Recovered, recover_items, recover_object};
use crate::domain::{
    DomainError, ExamQuestion, Flashcard, PyqEntry, QuizQuestion, StudyKind, StudySet, Summary,
};
use crate::ports::{AiPort, CompletionRequest, StudyRepoPort};
use crate::shared::config::{AppConfig, DEFAULT_MAX_ITEMS, DEFAULT_MIN_CONTENT_CHARS};
use crate::usecases::{profiles, prompts};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Shortest accepted PYQ search query.
const MIN_QUERY_CHARS: usize = 3;

/// Input limits and sampling settings.
#[derive(Debug, Clone)]
pub struct GenerationLimits {
    pub min_content_chars: usize,
    pub max_items: usize,
    pub temperature: f32,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            min_content_chars: DEFAULT_MIN_CONTENT_CHARS,
            max_items: DEFAULT_MAX_ITEMS,
            temperature: 0.4,
        }
    }
}

impl From<&AppConfig> for GenerationLimits {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            min_content_chars: cfg.min_content_chars_or_default(),
            max_items: cfg.max_items_or_default(),
            temperature: cfg.ai_temperature_or_default(),
        }
    }
}

/// A persisted generation result.
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub set_id: String,
    pub topic: String,
    pub items: T,
    /// True when the model output could not be used and placeholders were stored.
    pub used_fallback: bool,
}

/// Service for AI-powered study material generation.
pub struct GenerationService {
    ai: Arc<dyn AiPort>,
    repo: Arc<dyn StudyRepoPort>,
    limits: GenerationLimits,
}

impl GenerationService {
    /// Create a new generation service.
    ///
    /// # Arguments
    /// * `ai` - AI port implementation (OpenAI, Mock, etc.)
    /// * `repo` - Study set store
    /// * `limits` - Input validation limits and temperature
    pub fn new(ai: Arc<dyn AiPort>, repo: Arc<dyn StudyRepoPort>, limits: GenerationLimits) -> Self {
        Self { ai, repo, limits }
    }

    pub fn limits(&self) -> &GenerationLimits {
        &self.limits
    }

    /// Summarize a document into prose plus key points.
    pub async fn summarize(&self, topic: &str, text: &str) -> Result<Generated<Summary>, DomainError> {
        let topic = normalize_topic(topic);
        let text = self.validate_document(text)?;

        let raw = self
            .ask(CompletionRequest {
                task: StudyKind::Summary,
                system: prompts::summary_system(),
                user: prompts::document_user(&topic, text),
                json_mode: true,
                temperature: self.limits.temperature,
            })
            .await;

        let site = profiles::summary(&topic);
        let recovered = recover_object::<Summary>(&raw, &site.profile, site.fallback.as_ref());
        self.persist(StudyKind::Summary, topic, recovered).await
    }

    /// Generate `count` question/answer flashcards from a document.
    pub async fn generate_flashcards(
        &self,
        topic: &str,
        text: &str,
        count: usize,
    ) -> Result<Generated<Vec<Flashcard>>, DomainError> {
        let topic = normalize_topic(topic);
        let text = self.validate_document(text)?;
        let count = self.validate_count(count)?;

        let raw = self
            .ask(self.array_request(
                StudyKind::Flashcards,
                prompts::flashcards_system(count),
                prompts::document_user(&topic, text),
            ))
            .await;

        let site = profiles::flashcards(&topic, count);
        let recovered = recover_items::<Flashcard>(&raw, &site.profile, site.fallback.as_ref());
        self.persist(StudyKind::Flashcards, topic, recovered).await
    }

    /// Generate a `count`-question quiz from a document.
    pub async fn generate_quiz(
        &self,
        topic: &str,
        text: &str,
        count: usize,
    ) -> Result<Generated<Vec<QuizQuestion>>, DomainError> {
        let topic = normalize_topic(topic);
        let text = self.validate_document(text)?;
        let count = self.validate_count(count)?;

        let raw = self
            .ask(self.array_request(
                StudyKind::Quiz,
                prompts::quiz_system(count),
                prompts::document_user(&topic, text),
            ))
            .await;

        let site = profiles::quiz(&topic, count);
        let recovered = recover_items::<QuizQuestion>(&raw, &site.profile, site.fallback.as_ref());
        self.persist(StudyKind::Quiz, topic, recovered).await
    }

    /// Generate a `count`-question practice exam from a document.
    pub async fn generate_exam(
        &self,
        topic: &str,
        text: &str,
        count: usize,
    ) -> Result<Generated<Vec<ExamQuestion>>, DomainError> {
        let topic = normalize_topic(topic);
        let text = self.validate_document(text)?;
        let count = self.validate_count(count)?;

        let raw = self
            .ask(self.array_request(
                StudyKind::Exam,
                prompts::exam_system(count, &topic),
                prompts::document_user(&topic, text),
            ))
            .await;

        let site = profiles::exam(&topic, count);
        let recovered = recover_items::<ExamQuestion>(&raw, &site.profile, site.fallback.as_ref());
        self.persist(StudyKind::Exam, topic, recovered).await
    }

    /// Search past-year questions for a free-text query.
    pub async fn search_pyq(
        &self,
        query: &str,
        count: usize,
    ) -> Result<Generated<Vec<PyqEntry>>, DomainError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Err(DomainError::Validation(format!(
                "search query must be at least {} characters",
                MIN_QUERY_CHARS
            )));
        }
        let count = self.validate_count(count)?;

        let raw = self
            .ask(self.array_request(
                StudyKind::Pyq,
                prompts::pyq_system(count),
                prompts::pyq_user(query),
            ))
            .await;

        let site = profiles::pyq(query, count);
        let recovered = recover_items::<PyqEntry>(&raw, &site.profile, site.fallback.as_ref());
        self.persist(StudyKind::Pyq, query.to_string(), recovered).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Array tasks leave json_mode off: OpenAI's json_object mode only allows
    /// a top-level object.
    fn array_request(&self, task: StudyKind, system: String, user: String) -> CompletionRequest {
        CompletionRequest {
            task,
            system,
            user,
            json_mode: false,
            temperature: self.limits.temperature,
        }
    }

    /// Run the completion. A provider failure yields empty text, which the
    /// recovery parser turns into placeholder content.
    async fn ask(&self, request: CompletionRequest) -> String {
        match self.ai.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(task = %request.task, error = %e, "AI provider unavailable, using fallback content");
                String::new()
            }
        }
    }

    fn validate_document<'a>(&self, text: &'a str) -> Result<&'a str, DomainError> {
        let text = text.trim();
        let chars = text.chars().count();
        if chars < self.limits.min_content_chars {
            return Err(DomainError::Validation(format!(
                "document is too short ({} characters, need at least {})",
                chars, self.limits.min_content_chars
            )));
        }
        Ok(text)
    }

    fn validate_count(&self, count: usize) -> Result<usize, DomainError> {
        if count == 0 {
            return Err(DomainError::Validation("item count must be at least 1".into()));
        }
        if count > self.limits.max_items {
            warn!(count, max = self.limits.max_items, "requested count clamped");
            return Ok(self.limits.max_items);
        }
        Ok(count)
    }

    async fn persist<T: Serialize>(
        &self,
        kind: StudyKind,
        topic: String,
        recovered: Recovered<T>,
    ) -> Result<Generated<T>, DomainError> {
        let payload = serde_json::to_value(&recovered.value)
            .map_err(|e| DomainError::Repo(format!("Failed to encode {} payload: {}", kind, e)))?;
        let set = StudySet::new(kind, topic.clone(), payload, recovered.used_fallback);
        self.repo.save_set(&set).await?;

        info!(
            kind = %kind,
            set_id = %set.id,
            items = set.item_count(),
            strategy = ?recovered.strategy,
            dropped = recovered.dropped,
            used_fallback = recovered.used_fallback,
            "study set generated"
        );

        Ok(Generated {
            set_id: set.id,
            topic,
            items: recovered.value,
            used_fallback: recovered.used_fallback,
        })
    }
}

fn normalize_topic(topic: &str) -> String {
    let topic = topic.split_whitespace().collect::<Vec<_>>().join(" ");
    if topic.is_empty() {
        "General".to_string()
    } else {
        topic
    }
}
