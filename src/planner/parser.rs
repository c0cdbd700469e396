use crate::error::PlanError;
use crate::planner::{ArgValue, ToolStep};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Turns planner output into [`ToolStep`]s.
///
/// Parsing only checks shape and placeholder syntax; references and cycles
/// are checked by [`PlanGraph::validate`](crate::planner::PlanGraph::validate).
pub struct PlanParser;

#[derive(Deserialize)]
struct RawStep {
    #[serde(default)]
    id: Option<String>,
    tool: String,
    #[serde(default)]
    args: Map<String, Value>,
    #[serde(default)]
    depends_on: Vec<String>,
}

impl PlanParser {
    pub fn schema_prompt() -> &'static str {
        concat!(
            "Respond with a JSON array of tool steps in this exact format:\n",
            "[\n",
            "  {\n",
            "    \"id\": \"<unique-step-id>\",\n",
            "    \"tool\": \"<tool name>\",\n",
            "    \"args\": { \"<arg>\": <value> },\n",
            "    \"depends_on\": [\"<step-ids that must finish first>\"]\n",
            "  }\n",
            "]\n\n",
            "To use the output of an earlier step inside an argument, write ",
            "\"${<step-id>.<field>}\", for example \"(${w1.temp} + ${w2.temp}) / 2\".\n",
            "A placeholder on its own (\"${kb}\") passes the whole value through.\n",
            "Steps that need nothing from other steps use \"depends_on\": [].\n",
            "Return an empty array when no tool is needed.\n",
            "Wrap the JSON in a ```json code fence.",
        )
    }

    /// Extracts the JSON payload from a model response and parses it.
    pub fn parse_response(text: &str) -> Result<Vec<ToolStep>, PlanError> {
        let json = Self::extract_json(text)
            .ok_or_else(|| PlanError::InvalidPlan("no JSON found in planner output".into()))?;
        Self::parse(json)
    }

    /// Accepts `[steps...]`, `{"steps": [...]}` or `{"suggestions": [...]}`.
    pub fn parse(json_str: &str) -> Result<Vec<ToolStep>, PlanError> {
        let value: Value = serde_json::from_str(json_str)
            .map_err(|error| PlanError::InvalidPlan(format!("invalid plan JSON: {error}")))?;

        let raw_steps = match value {
            Value::Array(items) => Value::Array(items),
            Value::Object(mut object) => object
                .remove("steps")
                .or_else(|| object.remove("suggestions"))
                .ok_or_else(|| {
                    PlanError::InvalidPlan(
                        "plan object must contain a \"steps\" array".to_string(),
                    )
                })?,
            _ => {
                return Err(PlanError::InvalidPlan(
                    "plan must be a JSON array or object".to_string(),
                ));
            }
        };

        let raw_steps: Vec<RawStep> = serde_json::from_value(raw_steps)
            .map_err(|error| PlanError::InvalidPlan(format!("invalid plan step: {error}")))?;

        let ids = assign_ids(&raw_steps);
        raw_steps
            .into_iter()
            .zip(ids)
            .map(|(raw, id)| build_step(raw, id))
            .collect()
    }

    pub fn extract_json(text: &str) -> Option<&str> {
        if let Some(start) = text.find("```json") {
            let json_start = start + "```json".len();
            let rest = &text[json_start..];
            if let Some(end) = rest.find("```") {
                let candidate = rest[..end].trim();
                if !candidate.is_empty() {
                    return Some(candidate);
                }
            }
        }

        if let Some(start) = text.find("```\n") {
            let json_start = start + "```\n".len();
            let rest = &text[json_start..];
            if let Some(end) = rest.find("```") {
                let candidate = rest[..end].trim();
                if candidate.starts_with(['[', '{']) {
                    return Some(candidate);
                }
            }
        }

        let open = text.find(['[', '{'])?;
        let closing = if text[open..].starts_with('[') { ']' } else { '}' };
        let close = text.rfind(closing)?;
        if close > open {
            return Some(&text[open..=close]);
        }

        None
    }
}

fn build_step(raw: RawStep, id: String) -> Result<ToolStep, PlanError> {
    let mut args = BTreeMap::new();
    for (name, value) in raw.args {
        let parsed = ArgValue::parse(value).map_err(|error| PlanError::InvalidPlaceholder {
            step: id.clone(),
            arg: name.clone(),
            reason: error.to_string(),
        })?;
        args.insert(name, parsed);
    }

    Ok(ToolStep {
        id,
        tool: raw.tool.trim().to_string(),
        args,
        depends_on: raw
            .depends_on
            .into_iter()
            .map(|dependency| dependency.trim().to_string())
            .collect(),
    })
}

/// Steps without an id are named after their tool: `weather`, `weather_2`, ...
/// Explicit ids are never reused.
fn assign_ids(raw_steps: &[RawStep]) -> Vec<String> {
    let mut taken = raw_steps
        .iter()
        .filter_map(|raw| raw.id.as_deref())
        .map(|id| id.trim().to_string())
        .collect::<BTreeSet<_>>();

    let mut ids = Vec::with_capacity(raw_steps.len());
    for raw in raw_steps {
        if let Some(id) = &raw.id {
            ids.push(id.trim().to_string());
            continue;
        }

        let base = raw.tool.trim();
        let mut candidate = base.to_string();
        let mut suffix = 1;
        while taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{base}_{suffix}");
        }
        taken.insert(candidate.clone());
        ids.push(candidate);
    }
    ids
}
