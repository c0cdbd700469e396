use crate::engine::{BundleSummary, StepErrorKind, StepStatus};
use std::time::Duration;

/// Events the observer can record
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    QueryStart {
        query_id: String,
        steps: usize,
        waves: usize,
    },
    PlanRejected {
        reason: String,
    },
    WaveStart {
        index: usize,
        steps: usize,
    },
    WaveEnd {
        index: usize,
        duration: Duration,
    },
    ToolCall {
        step_id: String,
        tool: String,
        duration: Duration,
        status: StepStatus,
    },
    StepSkipped {
        step_id: String,
        tool: String,
        reason: StepErrorKind,
    },
    QueryEnd {
        query_id: String,
        duration: Duration,
        summary: BundleSummary,
        timed_out: bool,
    },
    Error {
        component: String,
        message: String,
    },
}

/// Numeric metrics
#[derive(Debug, Clone)]
pub enum ObserverMetric {
    QueryLatency(Duration),
    WaveCount(u64),
    ActiveSteps(u64),
}

/// Observability sink injected into the engine.
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &ObserverEvent);

    /// Record a numeric metric
    fn record_metric(&self, metric: &ObserverMetric);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
