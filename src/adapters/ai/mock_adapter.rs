//! Mock AI adapter for running without API calls.
//!
//! Returns canned, deliberately messy responses (prose + markdown fences) so the
//! recovery pipeline is exercised offline. Tests can script exact replies.

use crate::domain::{DomainError, StudyKind};
use crate::ports::{AiPort, CompletionRequest};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// Mock AI adapter.
///
/// Scripted replies are consumed first, in order; once exhausted the adapter
/// answers with a canned response for the request's task.
pub struct MockAiAdapter {
    /// Simulated network delay in milliseconds.
    delay_ms: u64,
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockAiAdapter {
    /// Create a new mock adapter with default delay (100ms).
    pub fn new() -> Self {
        Self::with_delay(100)
    }

    /// Create a mock adapter with custom delay.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a raw reply.
    pub fn push_reply(&self, text: impl Into<String>) -> &Self {
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(Ok(text.into()));
        self
    }

    /// Queue a provider failure.
    pub fn push_error(&self, message: impl Into<String>) -> &Self {
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(Err(message.into()));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn canned(task: StudyKind) -> &'static str {
        match task {
            StudyKind::Summary => {
                r#"Here is the summary you asked for:
```json
{"summary": "[MOCK] The notes cover the main ideas of the uploaded document.", "key_points": ["[MOCK] First idea", "[MOCK] Second idea"]}
```"#
            }
            StudyKind::Flashcards => {
                r#"Sure! Here are your flashcards:
```json
[
  {"question": "[MOCK] What is the main idea?", "answer": "[MOCK] The central concept of the document."},
  {"question": "[MOCK] Name one supporting detail.", "answer": "[MOCK] Any example from the notes."},
]
```
Good luck studying!"#
            }
            StudyKind::Quiz => {
                r#"```json
[{"question": "[MOCK] Which option is correct?", "type": "multiple_choice", "options": ["Alpha", "Beta", "Gamma", "Delta"], "correct_answer": "Beta", "explanation": "[MOCK] Beta is correct.", "points": "2"},
 {"question": "[MOCK] The notes are about studying.", "type": "true_false", "options": ["True", "False"], "correct_answer": "True"}]
```"#
            }
            StudyKind::Exam => {
                r#"Exam paper:
[{"question": "[MOCK] Define the key term.", "type": "short_answer", "marks": 5, "sample_answer": "[MOCK] A concise definition.", "difficulty": "Easy"},
 {"question": "[MOCK] Discuss the main argument.", "type": "long_answer", "marks": 10, "sample_answer": "[MOCK] A structured essay.", "difficulty": "hard"}]"#
            }
            StudyKind::Pyq => {
                r#"{"questions": [{"question": "[MOCK] Explain the topic with an example.", "year": 2022, "exam": "University Finals", "marks": 10}]}"#
            }
        }
    }
}

impl Default for MockAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AiPort for MockAiAdapter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        info!(
            task = %request.task,
            prompt_len = request.user.len(),
            "[MOCK] Simulating AI completion"
        );

        // Simulate network delay
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request.clone());

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        match scripted {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(DomainError::Ai(message)),
            None => Ok(Self::canned(request.task).to_string()),
        }
    }
}
