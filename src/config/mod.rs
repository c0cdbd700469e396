pub mod schema;

pub use schema::{
    Config, CurrencyToolConfig, EngineConfig, KnowledgeBaseToolConfig, ModelConfig, ObservabilityConfig,
    ToolEntry, ToolsConfig, WeatherToolConfig,
};
