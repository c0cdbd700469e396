use super::traits::Fuser;
use crate::engine::{ResultBundle, StepResult, StepStatus};
use serde_json::Value;
use std::fmt::Write;
use std::future::Future;
use std::pin::Pin;

/// Deterministic plain-text fusion of a [`ResultBundle`].
///
/// Successful steps are listed first, then every failed or skipped step
/// with its reason, so partial answers stay explicit about what is missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundleFuser;

impl BundleFuser {
    pub const fn new() -> Self {
        Self
    }

    pub fn render(query: &str, bundle: &ResultBundle) -> String {
        let mut out = String::new();
        if !query.trim().is_empty() {
            let _ = writeln!(out, "Query: {}", query.trim());
        }

        if bundle.is_empty() {
            out.push_str("No tools were needed for this query.\n");
            return out;
        }

        let (ok, not_ok): (Vec<&StepResult>, Vec<&StepResult>) =
            bundle.iter().partition(|result| result.is_success());

        if !ok.is_empty() {
            out.push_str("Results:\n");
            for result in ok {
                let value = result.value.as_ref().map_or_else(String::new, display_value);
                let _ = writeln!(out, "- {} ({}): {value}", result.step_id, result.tool);
            }
        }

        if !not_ok.is_empty() {
            out.push_str("Unavailable:\n");
            for result in not_ok {
                let verb = match result.status {
                    StepStatus::Skipped => "skipped",
                    _ => "failed",
                };
                let reason = result
                    .error
                    .as_ref()
                    .map_or_else(|| "no reason recorded".to_string(), ToString::to_string);
                let _ = writeln!(out, "- {} ({}) {verb}: {reason}", result.step_id, result.tool);
            }
        }

        out
    }
}

/// Prefers a record's `summary` field, then plain strings, then compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("summary") {
            Some(Value::String(summary)) => summary.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

impl Fuser for BundleFuser {
    fn name(&self) -> &str {
        "bundle"
    }

    fn fuse<'a>(
        &'a self,
        query: &'a str,
        bundle: &'a ResultBundle,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move { Ok(Self::render(query, bundle)) })
    }
}
