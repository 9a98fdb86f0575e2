use serde::{Deserialize, Serialize};

/// Settings for the model-backed chart recommender.
///
/// The recommender is only used when an API key is present; otherwise the
/// rule-based recommender serves every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub api_key: Option<String>,
    /// OpenAI-compatible endpoint root; `/chat/completions` is appended
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 0.1,
            max_tokens: 1500,
            timeout_secs: 30,
        }
    }
}

impl RecommenderConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}
