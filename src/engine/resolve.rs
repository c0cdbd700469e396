use crate::engine::{StepError, StepResult};
use crate::planner::{ArgValue, Placeholder, TemplatePart, ToolStep};
use crate::tools::ToolArgs;
use serde_json::Value;
use std::collections::BTreeMap;

/// Results of earlier waves, keyed by step id.
pub type PriorResults = BTreeMap<String, StepResult>;

/// Looks a placeholder up in the stored output of its source step.
fn lookup<'a>(placeholder: &Placeholder, prior: &'a PriorResults) -> Result<&'a Value, StepError> {
    let source = prior.get(&placeholder.step).ok_or_else(|| {
        StepError::missing_dependency(format!("step {} has no result", placeholder.step))
    })?;
    let value = source.value.as_ref().ok_or_else(|| {
        StepError::missing_dependency(format!(
            "step {} did not succeed ({})",
            placeholder.step, source.status
        ))
    })?;

    placeholder.path.lookup(value).ok_or_else(|| {
        StepError::missing_dependency(format!(
            "step {} output has no field '{}'",
            placeholder.step, placeholder.path
        ))
    })
}

/// Text form of a value inside a template: strings verbatim, everything
/// else as compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn resolve_value(arg: &ArgValue, prior: &PriorResults) -> Result<Value, StepError> {
    match arg {
        ArgValue::Literal(value) => Ok(value.clone()),
        ArgValue::Ref(placeholder) => lookup(placeholder, prior).cloned(),
        ArgValue::Template(parts) => {
            let mut rendered = String::new();
            for part in parts {
                match part {
                    TemplatePart::Text(text) => rendered.push_str(text),
                    TemplatePart::Ref(placeholder) => {
                        rendered.push_str(&render(lookup(placeholder, prior)?));
                    }
                }
            }
            Ok(Value::String(rendered))
        }
    }
}

/// Replaces every placeholder in `step.args` with plain values.
pub fn resolve_args(step: &ToolStep, prior: &PriorResults) -> Result<ToolArgs, StepError> {
    step.args
        .iter()
        .map(|(name, arg)| Ok((name.clone(), resolve_value(arg, prior)?)))
        .collect()
}
