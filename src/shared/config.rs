//! Application configuration. API credentials, paths, generation limits.

use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use tracing::warn;

/// Default cap on items per generated set (flashcards, questions, PYQs).
pub const DEFAULT_MAX_ITEMS: usize = 50;

/// Default minimum document length accepted for generation.
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 50;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory for the database and exports. Read from STUDYFORGE_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// AI API key (e.g., OpenAI). Read from STUDYFORGE_AI_API_KEY.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// AI API URL. Defaults to OpenAI. Read from STUDYFORGE_AI_API_URL.
    #[serde(default)]
    pub ai_api_url: Option<String>,

    /// AI model name. Defaults to "gpt-4o-mini". Read from STUDYFORGE_AI_MODEL.
    #[serde(default)]
    pub ai_model: Option<String>,

    /// Sampling temperature. Read from STUDYFORGE_AI_TEMPERATURE.
    #[serde(default, deserialize_with = "lenient_number")]
    pub ai_temperature: Option<f32>,

    /// HTTP timeout for one completion, in seconds. Read from STUDYFORGE_AI_TIMEOUT_SECS.
    #[serde(default, deserialize_with = "lenient_number")]
    pub ai_timeout_secs: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Generation limits
    // ─────────────────────────────────────────────────────────────────────────
    /// Documents shorter than this are rejected. Read from STUDYFORGE_MIN_CONTENT_CHARS.
    #[serde(default, deserialize_with = "lenient_number")]
    pub min_content_chars: Option<usize>,

    /// Upper bound on requested item counts. Read from STUDYFORGE_MAX_ITEMS.
    #[serde(default, deserialize_with = "lenient_number")]
    pub max_items: Option<usize>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("STUDYFORGE"));
        if let Ok(path) = std::env::var("STUDYFORGE_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the data directory. Defaults to "./data".
    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    /// Returns the AI API key if configured. Reads from config or STUDYFORGE_AI_API_KEY env.
    pub fn ai_api_key(&self) -> Option<String> {
        self.ai_api_key
            .clone()
            .or_else(|| std::env::var("STUDYFORGE_AI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Returns the AI API URL. Defaults to OpenAI chat completions endpoint.
    pub fn ai_api_url_or_default(&self) -> String {
        self.ai_api_url
            .clone()
            .or_else(|| std::env::var("STUDYFORGE_AI_API_URL").ok())
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string())
    }

    /// Returns the AI model name. Defaults to "gpt-4o-mini".
    pub fn ai_model_or_default(&self) -> String {
        self.ai_model
            .clone()
            .or_else(|| std::env::var("STUDYFORGE_AI_MODEL").ok())
            .unwrap_or_else(|| "gpt-4o-mini".to_string())
    }

    /// Returns the sampling temperature, clamped to [0, 2]. Defaults to 0.4.
    pub fn ai_temperature_or_default(&self) -> f32 {
        self.ai_temperature.unwrap_or(0.4).clamp(0.0, 2.0)
    }

    /// Returns the request timeout in seconds. Defaults to 60.
    pub fn ai_timeout_secs_or_default(&self) -> u64 {
        self.ai_timeout_secs.unwrap_or(60)
    }

    /// Returns true if AI is configured (API key present).
    pub fn is_ai_configured(&self) -> bool {
        self.ai_api_key().is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Generation limits
    // ─────────────────────────────────────────────────────────────────────────

    pub fn min_content_chars_or_default(&self) -> usize {
        self.min_content_chars.unwrap_or(DEFAULT_MIN_CONTENT_CHARS)
    }

    /// Never below 1.
    pub fn max_items_or_default(&self) -> usize {
        self.max_items.unwrap_or(DEFAULT_MAX_ITEMS).max(1)
    }
}

/// Numbers arrive as strings from env vars and as numbers from files. An
/// unparseable value reads as unset so the rest of the config still loads.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match &raw {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) => s.trim().parse::<T>().ok(),
        Some(serde_json::Value::Number(n)) => n.to_string().parse::<T>().ok(),
        Some(_) => None,
    };
    if parsed.is_none() {
        warn!(value = ?raw, "ignoring unparseable numeric config value");
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.data_dir_or_default(), "./data");
        assert_eq!(cfg.ai_timeout_secs_or_default(), 60);
        assert_eq!(cfg.min_content_chars_or_default(), DEFAULT_MIN_CONTENT_CHARS);
        assert_eq!(cfg.max_items_or_default(), DEFAULT_MAX_ITEMS);
        assert!((cfg.ai_temperature_or_default() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_limits_are_sanitized() {
        let cfg = AppConfig {
            max_items: Some(0),
            ai_temperature: Some(9.0),
            ..Default::default()
        };
        assert_eq!(cfg.max_items_or_default(), 1);
        assert_eq!(cfg.ai_temperature_or_default(), 2.0);
    }

    #[test]
    fn test_bad_numeric_value_keeps_rest_of_config() {
        let cfg: AppConfig = config::Config::builder()
            .set_override("ai_api_key", "sk-test")
            .unwrap()
            .set_override("max_items", "abc")
            .unwrap()
            .set_override("ai_timeout_secs", "30")
            .unwrap()
            .set_override("ai_temperature", 0.7)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.ai_api_key.as_deref(), Some("sk-test"));
        assert!(cfg.is_ai_configured());
        assert_eq!(cfg.max_items, None);
        assert_eq!(cfg.max_items_or_default(), DEFAULT_MAX_ITEMS);
        assert_eq!(cfg.ai_timeout_secs_or_default(), 30);
        assert!((cfg.ai_temperature_or_default() - 0.7).abs() < 1e-6);
    }
}
