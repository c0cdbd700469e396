use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

const PLACEHOLDER_OPEN: &str = "${";
const PLACEHOLDER_CLOSE: char = '}';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderSyntaxError {
    #[error("unclosed placeholder in \"{0}\"")]
    Unclosed(String),

    #[error("placeholder has no step id")]
    EmptyReference,

    #[error("placeholder \"{0}\" has an empty field path segment")]
    EmptyPathSegment(String),
}

/// Dotted path into a step's output value. Numeric segments index arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Lenient constructor: empty segments are dropped.
    pub fn new(path: &str) -> Self {
        Self(
            path.split('.')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn lookup<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.0
            .iter()
            .try_fold(value, |current, segment| match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index)),
                _ => None,
            })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Typed reference to another step's output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placeholder {
    pub step: String,
    #[serde(default)]
    pub path: FieldPath,
}

impl Placeholder {
    pub fn new(step: impl Into<String>, path: &str) -> Self {
        Self {
            step: step.into(),
            path: FieldPath::new(path),
        }
    }

    /// Parses the inside of `${...}`: a step id optionally followed by a
    /// dotted field path.
    pub fn parse(reference: &str) -> Result<Self, PlaceholderSyntaxError> {
        let reference = reference.trim();
        let mut segments = reference.split('.');
        let step = segments.next().unwrap_or_default().trim();
        if step.is_empty() {
            return Err(PlaceholderSyntaxError::EmptyReference);
        }

        let mut path = Vec::new();
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(PlaceholderSyntaxError::EmptyPathSegment(
                    reference.to_string(),
                ));
            }
            path.push(segment.to_string());
        }

        Ok(Self {
            step: step.to_string(),
            path: FieldPath(path),
        })
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "${{{}}}", self.step)
        } else {
            write!(f, "${{{}.{}}}", self.step, self.path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplatePart {
    Text(String),
    Ref(Placeholder),
}

/// A step argument as proposed by the planner.
///
/// `Ref` resolves to the referenced value verbatim, keeping its JSON type.
/// `Template` always resolves to a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgValue {
    Literal(Value),
    Ref(Placeholder),
    Template(Vec<TemplatePart>),
}

impl ArgValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn reference(step: impl Into<String>, path: &str) -> Self {
        Self::Ref(Placeholder::new(step, path))
    }

    /// Interprets `${step.path}` markers inside string values. Non-string
    /// values are always literals.
    pub fn parse(value: Value) -> Result<Self, PlaceholderSyntaxError> {
        match value {
            Value::String(text) => Self::template(&text),
            other => Ok(Self::Literal(other)),
        }
    }

    pub fn template(text: &str) -> Result<Self, PlaceholderSyntaxError> {
        if !text.contains(PLACEHOLDER_OPEN) {
            return Ok(Self::Literal(Value::String(text.to_string())));
        }

        let mut parts = Vec::new();
        let mut rest = text;
        while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
            if start > 0 {
                parts.push(TemplatePart::Text(rest[..start].to_string()));
            }
            let after_open = &rest[start + PLACEHOLDER_OPEN.len()..];
            let end = after_open
                .find(PLACEHOLDER_CLOSE)
                .ok_or_else(|| PlaceholderSyntaxError::Unclosed(text.to_string()))?;
            parts.push(TemplatePart::Ref(Placeholder::parse(&after_open[..end])?));
            rest = &after_open[end + 1..];
        }
        if !rest.is_empty() {
            parts.push(TemplatePart::Text(rest.to_string()));
        }

        if let [TemplatePart::Ref(placeholder)] = parts.as_slice() {
            return Ok(Self::Ref(placeholder.clone()));
        }
        Ok(Self::Template(parts))
    }

    pub fn placeholders(&self) -> Vec<&Placeholder> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Ref(placeholder) => vec![placeholder],
            Self::Template(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    TemplatePart::Ref(placeholder) => Some(placeholder),
                    TemplatePart::Text(_) => None,
                })
                .collect(),
        }
    }
}

/// One planned tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStep {
    pub id: String,
    pub tool: String,
    #[serde(default)]
    pub args: BTreeMap<String, ArgValue>,
    /// Ordering-only dependencies.
    #[serde(default)]
    pub depends_on: BTreeSet<String>,
}

impl ToolStep {
    pub fn new(id: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool: tool.into(),
            args: BTreeMap::new(),
            depends_on: BTreeSet::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    pub fn with_literal(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_arg(name, ArgValue::literal(value))
    }

    pub fn with_reference(
        self,
        name: impl Into<String>,
        step: impl Into<String>,
        path: &str,
    ) -> Self {
        self.with_arg(name, ArgValue::reference(step, path))
    }

    pub fn after(mut self, step: impl Into<String>) -> Self {
        self.depends_on.insert(step.into());
        self
    }

    /// Every `(argument, placeholder)` pair in this step.
    pub fn placeholders(&self) -> impl Iterator<Item = (&str, &Placeholder)> {
        self.args.iter().flat_map(|(name, value)| {
            value
                .placeholders()
                .into_iter()
                .map(move |placeholder| (name.as_str(), placeholder))
        })
    }

    /// Step ids this step must wait for, from placeholders and explicit
    /// dependencies.
    pub fn referenced_steps(&self) -> BTreeSet<&str> {
        self.placeholders()
            .map(|(_, placeholder)| placeholder.step.as_str())
            .chain(self.depends_on.iter().map(String::as_str))
            .collect()
    }
}
