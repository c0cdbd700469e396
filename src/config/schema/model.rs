use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

fn default_model_url() -> String {
    DEFAULT_MODEL_API_URL.into()
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// OpenAI-compatible chat endpoint used by `toolweave ask` for planning and
/// fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL; `/chat/completions` is appended unless already present.
    #[serde(default = "default_model_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Usually supplied through `OPENAI_API_KEY` instead of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_url(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
