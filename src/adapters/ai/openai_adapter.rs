//! OpenAI-compatible adapter for study-material generation.
//!
//! Supports OpenAI API, Azure OpenAI, and local Ollama instances.
//! Returns the raw completion text; JSON recovery happens in the domain layer.

use crate::domain::DomainError;
use crate::ports::{AiPort, CompletionRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// OpenAI-compatible AI adapter.
///
/// Can be configured to work with:
/// - OpenAI API (api.openai.com)
/// - Azure OpenAI
/// - Ollama (localhost)
/// - Any OpenAI-compatible API
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAdapter {
    /// Create a new OpenAI adapter.
    ///
    /// # Arguments
    /// * `api_url` - API endpoint (e.g., "https://api.openai.com/v1/chat/completions")
    /// * `api_key` - API key (can be empty for local Ollama)
    /// * `model` - Model name (e.g., "gpt-4o-mini", "llama3.2")
    /// * `timeout` - Per-request timeout
    pub fn new(api_url: String, api_key: String, model: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeout, using defaults");
                reqwest::Client::new()
            });
        Self {
            client,
            api_url,
            api_key,
            model,
        }
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            temperature: request.temperature,
            response_format: request.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

/// OpenAI API request structure.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// OpenAI API response structure.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait::async_trait]
impl AiPort for OpenAiAdapter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        info!(
            task = %request.task,
            prompt_len = request.user.len(),
            json_mode = request.json_mode,
            "sending completion request"
        );

        let body = self.build_request(request);

        let mut http = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&body);
        if !self.api_key.is_empty() {
            http = http.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = http
            .send()
            .await
            .map_err(|e| DomainError::Ai(format!("HTTP request failed: {}", e)))?;

        // Check status
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "AI API returned error");
            return Err(DomainError::Ai(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Ai(format!("Failed to parse API response: {}", e)))?;

        let raw_content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::Ai("No response choices returned".to_string()))?;

        debug!(task = %request.task, raw_len = raw_content.len(), "received AI response");

        Ok(raw_content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StudyKind;

    fn adapter() -> OpenAiAdapter {
        OpenAiAdapter::new(
            "http://localhost:11434/v1/chat/completions".into(),
            String::new(),
            "llama3.2".into(),
            Duration::from_secs(5),
        )
    }

    fn request(json_mode: bool) -> CompletionRequest {
        CompletionRequest {
            task: StudyKind::Quiz,
            system: "system".into(),
            user: "user".into(),
            json_mode,
            temperature: 0.2,
        }
    }

    #[test]
    fn test_request_body_json_mode() {
        let body = serde_json::to_value(adapter().build_request(&request(true))).unwrap();
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_request_body_plain() {
        let body = serde_json::to_value(adapter().build_request(&request(false))).unwrap();
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_response_with_null_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
