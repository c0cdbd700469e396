use super::super::{EngineConfig, ModelConfig, ObservabilityConfig, ToolsConfig};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_parallel_steps == 0 {
            return Err(ConfigError::Validation(
                "engine.max_parallel_steps must be at least 1".into(),
            ));
        }
        if self.engine.step_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "engine.step_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.engine.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "engine.query_timeout_ms must be greater than 0".into(),
            ));
        }

        let endpoints = [
            ("tools.weather.base_url", &self.tools.weather.base_url),
            (
                "tools.currency_converter.base_url",
                &self.tools.currency_converter.base_url,
            ),
            ("model.base_url", &self.model.base_url),
        ];
        for (field, value) in endpoints {
            url::Url::parse(value).map_err(|error| {
                ConfigError::Validation(format!("{field} is not a valid URL ({value}): {error}"))
            })?;
        }

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::Validation(format!(
                "model.temperature must be within 0.0..=2.0, got {}",
                self.model.temperature
            )));
        }

        let threshold = self.tools.knowledge_base.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Validation(format!(
                "tools.knowledge_base.threshold must be within 0.0..=1.0, got {threshold}"
            )));
        }

        Ok(())
    }
}
