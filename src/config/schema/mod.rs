mod core;
mod engine;
mod model;
mod observability;
mod tools;

pub use core::Config;
pub use engine::EngineConfig;
#[allow(unused_imports)]
pub use model::{DEFAULT_MODEL, DEFAULT_MODEL_API_URL, ModelConfig};
pub use observability::ObservabilityConfig;
#[allow(unused_imports)]
pub use tools::{
    CurrencyToolConfig, DEFAULT_CURRENCY_API_URL, DEFAULT_KNOWLEDGE_BASE_PATH,
    DEFAULT_WEATHER_API_URL, KnowledgeBaseToolConfig, ToolEntry, ToolsConfig, WeatherToolConfig,
};
