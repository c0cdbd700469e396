use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;

/// Resolved arguments handed to a tool. Never contains placeholders.
pub type ToolArgs = Map<String, Value>;

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send + 'a>>;

/// Description of a tool for the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A capability the engine can invoke by name.
pub trait Tool: Send + Sync {
    /// Tool name (used as the plan's `tool` identifier)
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// JSON schema for parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with plain argument values.
    ///
    /// The returned value is stored verbatim so later steps can pick fields
    /// out of it.
    fn execute<'a>(&'a self, args: ToolArgs) -> ToolFuture<'a>;

    /// Get the full spec for planner registration
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Non-empty, trimmed string argument.
pub(crate) fn string_arg<'a>(args: &'a ToolArgs, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Numeric argument; numeric strings are accepted since templated
/// arguments always render to text.
pub(crate) fn number_arg(args: &ToolArgs, name: &str) -> Option<f64> {
    match args.get(name)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Rounds to one decimal place, the precision tools report measurements in.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Encodes a float as a JSON number, rejecting NaN and infinities.
pub(crate) fn number_value(value: f64) -> Option<Value> {
    serde_json::Number::from_f64(value).map(Value::Number)
}
