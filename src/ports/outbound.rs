//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{DomainError, StudyKind, StudySet};

/// One chat-completion call. `json_mode` asks the provider for a JSON
/// response; the text still goes through the recovery parser.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub task: StudyKind,
    pub system: String,
    pub user: String,
    pub json_mode: bool,
    pub temperature: f32,
}

/// Language-model gateway. Returns the raw text of the first choice.
#[async_trait::async_trait]
pub trait AiPort: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError>;
}

/// Study set store. Payloads are opaque JSON.
#[async_trait::async_trait]
pub trait StudyRepoPort: Send + Sync {
    async fn save_set(&self, set: &StudySet) -> Result<(), DomainError>;

    /// `Ok(None)` when no set has this id.
    async fn get_set(&self, id: &str) -> Result<Option<StudySet>, DomainError>;

    /// Newest first. `kind = None` lists every kind.
    async fn list_sets(
        &self,
        kind: Option<StudyKind>,
        limit: u32,
    ) -> Result<Vec<StudySet>, DomainError>;
}
