use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_CURRENCY_API_URL: &str = "https://api.frankfurter.dev/v1";
pub const DEFAULT_KNOWLEDGE_BASE_PATH: &str = "~/.toolweave/knowledge_base.json";

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_weather_url() -> String {
    DEFAULT_WEATHER_API_URL.into()
}

fn default_currency_url() -> String {
    DEFAULT_CURRENCY_API_URL.into()
}

fn default_knowledge_base_path() -> String {
    DEFAULT_KNOWLEDGE_BASE_PATH.into()
}

fn default_similarity_threshold() -> f64 {
    0.75
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntry {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ToolEntry {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Usually supplied through `WEATHER_API_KEY` instead of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_weather_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for WeatherToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: default_weather_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_currency_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CurrencyToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_currency_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// JSON file with `{"entries": [...]}`; `~` is expanded.
    #[serde(default = "default_knowledge_base_path")]
    pub path: String,
    /// Minimum Jaccard similarity for a match.
    #[serde(default = "default_similarity_threshold")]
    pub threshold: f64,
}

impl KnowledgeBaseToolConfig {
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).into_owned())
    }
}

impl Default for KnowledgeBaseToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_knowledge_base_path(),
            threshold: default_similarity_threshold(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub calculator: ToolEntry,
    #[serde(default)]
    pub weather: WeatherToolConfig,
    #[serde(default)]
    pub currency_converter: CurrencyToolConfig,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseToolConfig,
}
