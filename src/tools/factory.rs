use super::{
    CalculatorTool, CurrencyConverterTool, KnowledgeBaseTool, Tool, ToolRegistry, WeatherTool,
};
use crate::config::ToolsConfig;
use anyhow::Context;

/// Build the registry from the enabled tools.
pub fn default_tools(config: &ToolsConfig) -> anyhow::Result<ToolRegistry> {
    let mut tools: Vec<Box<dyn Tool>> = Vec::new();

    if config.calculator.enabled {
        tools.push(Box::new(CalculatorTool::new()));
    }

    if config.weather.enabled {
        if config.weather.api_key.is_none() {
            tracing::warn!("weather tool enabled without an API key; weather steps will fail");
        }
        tools.push(Box::new(WeatherTool::new(&config.weather)));
    }

    if config.currency_converter.enabled {
        tools.push(Box::new(CurrencyConverterTool::new(&config.currency_converter)));
    }

    if config.knowledge_base.enabled {
        let kb_config = &config.knowledge_base;
        let knowledge_base =
            KnowledgeBaseTool::load(&kb_config.resolved_path(), kb_config.threshold)
                .context("Failed to load knowledge base")?;
        tools.push(Box::new(knowledge_base));
    }

    let registry: ToolRegistry = tools.into_iter().collect();
    tracing::debug!(tools = ?registry.tool_names(), "tool registry built");
    Ok(registry)
}

/// (`tool_name`, description) pairs for planner prompts. The description
/// ends with the argument names from the tool's parameter schema.
pub fn tool_descriptions(registry: &ToolRegistry) -> Vec<(String, String)> {
    registry
        .specs()
        .into_iter()
        .map(|spec| {
            let args = spec
                .parameters
                .get("properties")
                .and_then(serde_json::Value::as_object)
                .map(|properties| properties.keys().cloned().collect::<Vec<_>>())
                .unwrap_or_default();
            let description = if args.is_empty() {
                spec.description
            } else {
                format!("{} (args: {})", spec.description, args.join(", "))
            };
            (spec.name, description)
        })
        .collect()
}
