use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("TOOLWEAVE_MAX_PARALLEL_STEPS")
            && let Ok(parsed) = value.parse::<usize>()
            && parsed > 0
        {
            self.engine.max_parallel_steps = parsed;
        }

        if let Ok(value) = std::env::var("TOOLWEAVE_STEP_TIMEOUT_MS")
            && let Ok(parsed) = value.parse::<u64>()
            && parsed > 0
        {
            self.engine.step_timeout_ms = parsed;
        }

        if let Ok(value) = std::env::var("TOOLWEAVE_QUERY_TIMEOUT_MS")
            && let Ok(parsed) = value.parse::<u64>()
            && parsed > 0
        {
            self.engine.query_timeout_ms = parsed;
        }

        if let Ok(backend) = std::env::var("TOOLWEAVE_OBSERVABILITY")
            && !backend.is_empty()
        {
            self.observability.backend = backend;
        }

        if let Ok(key) =
            std::env::var("TOOLWEAVE_WEATHER_API_KEY").or_else(|_| std::env::var("WEATHER_API_KEY"))
            && !key.is_empty()
        {
            self.tools.weather.api_key = Some(key);
        }

        if let Ok(url) = std::env::var("TOOLWEAVE_WEATHER_URL")
            && !url.is_empty()
        {
            self.tools.weather.base_url = url;
        }

        if let Ok(url) = std::env::var("TOOLWEAVE_CURRENCY_URL")
            && !url.is_empty()
        {
            self.tools.currency_converter.base_url = url;
        }

        if let Ok(key) =
            std::env::var("TOOLWEAVE_MODEL_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"))
            && !key.is_empty()
        {
            self.model.api_key = Some(key);
        }

        if let Ok(url) = std::env::var("TOOLWEAVE_MODEL_URL")
            && !url.is_empty()
        {
            self.model.base_url = url;
        }

        if let Ok(model) = std::env::var("TOOLWEAVE_MODEL")
            && !model.is_empty()
        {
            self.model.model = model;
        }

        if let Ok(path) = std::env::var("TOOLWEAVE_KNOWLEDGE_BASE")
            && !path.is_empty()
        {
            self.tools.knowledge_base.path = path;
        }
    }
}
