use crate::planner::PlanGraph;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use strum::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepErrorKind {
    /// A predecessor did not succeed, or its output lacks a referenced field.
    MissingDependency,
    ToolExecution,
    ToolTimeout,
    /// The outer query deadline passed before the step finished.
    QueryTimeout,
}

/// Per-step failure. Contained to the step and its dependents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct StepError {
    pub kind: StepErrorKind,
    pub message: String,
}

impl StepError {
    pub fn new(kind: StepErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_dependency(message: impl Into<String>) -> Self {
        Self::new(StepErrorKind::MissingDependency, message)
    }

    pub fn tool_execution(tool: &str, cause: impl std::fmt::Display) -> Self {
        Self::new(StepErrorKind::ToolExecution, format!("{tool}: {cause}"))
    }

    pub fn tool_timeout(tool: &str, timeout: Duration) -> Self {
        Self::new(
            StepErrorKind::ToolTimeout,
            format!("{tool} timed out after {}ms", timeout.as_millis()),
        )
    }

    pub fn query_timeout() -> Self {
        Self::new(
            StepErrorKind::QueryTimeout,
            "query deadline exceeded before the step finished",
        )
    }
}

/// Outcome of one plan step. Write-once.
///
/// `value` is present iff the step succeeded; `error` iff it did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub tool: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
}

impl StepResult {
    pub fn success(step_id: impl Into<String>, tool: impl Into<String>, value: Value) -> Self {
        Self {
            step_id: step_id.into(),
            tool: tool.into(),
            status: StepStatus::Success,
            value: Some(value),
            error: None,
        }
    }

    pub fn failed(step_id: impl Into<String>, tool: impl Into<String>, error: StepError) -> Self {
        Self {
            step_id: step_id.into(),
            tool: tool.into(),
            status: StepStatus::Failed,
            value: None,
            error: Some(error),
        }
    }

    pub fn skipped(step_id: impl Into<String>, tool: impl Into<String>, error: StepError) -> Self {
        Self {
            step_id: step_id.into(),
            tool: tool.into(),
            status: StepStatus::Skipped,
            value: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }

    pub fn error_kind(&self) -> Option<StepErrorKind> {
        self.error.as_ref().map(|error| error.kind)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BundleSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a StepResult>) -> Self {
        results
            .into_iter()
            .fold(Self::default(), |mut summary, result| {
                summary.total += 1;
                match result.status {
                    StepStatus::Success => summary.succeeded += 1,
                    StepStatus::Failed => summary.failed += 1,
                    StepStatus::Skipped => summary.skipped += 1,
                }
                summary
            })
    }

    /// Non-empty plan where nothing succeeded.
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.succeeded == 0
    }
}

/// Every step outcome of one plan, in plan declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    results: Vec<StepResult>,
    wave_count: usize,
    summary: BundleSummary,
}

impl ResultBundle {
    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    pub fn get(&self, step_id: &str) -> Option<&StepResult> {
        self.results.iter().find(|result| result.step_id == step_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepResult> {
        self.results.iter()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &StepResult> {
        self.results.iter().filter(|result| result.is_success())
    }

    pub fn summary(&self) -> BundleSummary {
        self.summary
    }

    pub fn wave_count(&self) -> usize {
        self.wave_count
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn all_failed(&self) -> bool {
        self.summary.all_failed()
    }

    pub fn into_results(self) -> Vec<StepResult> {
        self.results
    }
}

impl<'a> IntoIterator for &'a ResultBundle {
    type Item = &'a StepResult;
    type IntoIter = std::slice::Iter<'a, StepResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

pub struct ResultAggregator;

impl ResultAggregator {
    /// Orders results by declaration and computes the summary.
    ///
    /// Steps with no result were never reached before the query deadline
    /// and are recorded as skipped with [`StepErrorKind::QueryTimeout`].
    pub fn aggregate(
        graph: &PlanGraph,
        wave_results: impl IntoIterator<Item = StepResult>,
        wave_count: usize,
    ) -> ResultBundle {
        let mut by_id = wave_results
            .into_iter()
            .map(|result| (result.step_id.clone(), result))
            .collect::<BTreeMap<_, _>>();

        let results = graph
            .steps()
            .iter()
            .map(|step| {
                by_id.remove(&step.id).unwrap_or_else(|| {
                    StepResult::skipped(&step.id, &step.tool, StepError::query_timeout())
                })
            })
            .collect::<Vec<_>>();

        if !by_id.is_empty() {
            tracing::warn!(
                unknown = ?by_id.keys().collect::<Vec<_>>(),
                "dropping results for steps outside the plan"
            );
        }

        let summary = BundleSummary::from_results(&results);
        ResultBundle {
            results,
            wave_count,
            summary,
        }
    }
}
