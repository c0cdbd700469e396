use super::traits::{Observer, ObserverEvent, ObserverMetric};
use crate::engine::StepStatus;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_total: u64,
    pub plans_rejected: u64,
    pub queries_timed_out: u64,
    pub waves_total: u64,
    pub tool_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub skipped_steps: u64,
    pub errors_total: u64,
    pub total_query_time_ms: u64,
    /// Highest number of tool calls seen in flight at once.
    pub peak_active_steps: u64,
    pub tool_usage: BTreeMap<String, u64>,
    /// Tool names in order of first invocation.
    pub execution_sequence: Vec<String>,
}

impl MetricsSnapshot {
    pub fn average_query_time_ms(&self) -> u64 {
        self.total_query_time_ms
            .checked_div(self.queries_total)
            .unwrap_or(0)
    }
}

/// In-process counters with a Prometheus-style text exposition.
pub struct MetricsObserver {
    queries_total: AtomicU64,
    plans_rejected: AtomicU64,
    queries_timed_out: AtomicU64,
    waves_total: AtomicU64,
    tool_calls: AtomicU64,
    successful_calls: AtomicU64,
    failed_calls: AtomicU64,
    skipped_steps: AtomicU64,
    errors_total: AtomicU64,
    total_query_time_ms: AtomicU64,
    peak_active_steps: AtomicU64,
    tool_usage: Mutex<BTreeMap<String, u64>>,
    execution_sequence: Mutex<Vec<String>>,
}

impl MetricsObserver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queries_total: AtomicU64::new(0),
            plans_rejected: AtomicU64::new(0),
            queries_timed_out: AtomicU64::new(0),
            waves_total: AtomicU64::new(0),
            tool_calls: AtomicU64::new(0),
            successful_calls: AtomicU64::new(0),
            failed_calls: AtomicU64::new(0),
            skipped_steps: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            total_query_time_ms: AtomicU64::new(0),
            peak_active_steps: AtomicU64::new(0),
            tool_usage: Mutex::new(BTreeMap::new()),
            execution_sequence: Mutex::new(Vec::new()),
        }
    }

    fn record_tool_use(&self, tool: &str) {
        if let Ok(mut guard) = self.tool_usage.lock() {
            let entry = guard.entry(tool.to_string()).or_insert(0);
            *entry = entry.saturating_add(1);
        }
        if let Ok(mut guard) = self.execution_sequence.lock()
            && !guard.iter().any(|name| name == tool)
        {
            guard.push(tool.to_string());
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_total: self.queries_total.load(Ordering::Relaxed),
            plans_rejected: self.plans_rejected.load(Ordering::Relaxed),
            queries_timed_out: self.queries_timed_out.load(Ordering::Relaxed),
            waves_total: self.waves_total.load(Ordering::Relaxed),
            tool_calls: self.tool_calls.load(Ordering::Relaxed),
            successful_calls: self.successful_calls.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            skipped_steps: self.skipped_steps.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
            total_query_time_ms: self.total_query_time_ms.load(Ordering::Relaxed),
            peak_active_steps: self.peak_active_steps.load(Ordering::Relaxed),
            tool_usage: self
                .tool_usage
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default(),
            execution_sequence: self
                .execution_sequence
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default(),
        }
    }

    /// Text exposition format.
    pub fn render(&self) -> String {
        let snapshot = self.snapshot();
        let counters = [
            ("toolweave_queries_total", "Plans executed", snapshot.queries_total),
            ("toolweave_plans_rejected_total", "Plans rejected at validation", snapshot.plans_rejected),
            ("toolweave_queries_timed_out_total", "Plans cut short by the query deadline", snapshot.queries_timed_out),
            ("toolweave_waves_total", "Waves executed", snapshot.waves_total),
            ("toolweave_tool_calls_total", "Tool invocations", snapshot.tool_calls),
            ("toolweave_tool_calls_succeeded_total", "Tool invocations that succeeded", snapshot.successful_calls),
            ("toolweave_tool_calls_failed_total", "Tool invocations that failed", snapshot.failed_calls),
            ("toolweave_steps_skipped_total", "Steps skipped without invocation", snapshot.skipped_steps),
            ("toolweave_errors_total", "Errors reported by components", snapshot.errors_total),
        ];

        let mut out = String::new();
        for (name, help, value) in counters {
            let _ = writeln!(out, "# HELP {name} {help}");
            let _ = writeln!(out, "# TYPE {name} counter");
            let _ = writeln!(out, "{name} {value}");
        }

        let _ = writeln!(out, "# HELP toolweave_peak_active_steps Most tool calls in flight at once");
        let _ = writeln!(out, "# TYPE toolweave_peak_active_steps gauge");
        let _ = writeln!(out, "toolweave_peak_active_steps {}", snapshot.peak_active_steps);

        let _ = writeln!(out, "# HELP toolweave_tool_usage_total Invocations per tool");
        let _ = writeln!(out, "# TYPE toolweave_tool_usage_total counter");
        for (tool, count) in &snapshot.tool_usage {
            let _ = writeln!(out, "toolweave_tool_usage_total{{tool=\"{tool}\"}} {count}");
        }
        out
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for MetricsObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::QueryStart { .. } => {
                self.queries_total.fetch_add(1, Ordering::Relaxed);
            }
            ObserverEvent::PlanRejected { .. } => {
                self.plans_rejected.fetch_add(1, Ordering::Relaxed);
            }
            ObserverEvent::WaveStart { .. } => {
                self.waves_total.fetch_add(1, Ordering::Relaxed);
            }
            ObserverEvent::ToolCall { tool, status, .. } => {
                self.tool_calls.fetch_add(1, Ordering::Relaxed);
                self.record_tool_use(tool);
                if *status == StepStatus::Success {
                    self.successful_calls.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.failed_calls.fetch_add(1, Ordering::Relaxed);
                }
            }
            ObserverEvent::StepSkipped { .. } => {
                self.skipped_steps.fetch_add(1, Ordering::Relaxed);
            }
            ObserverEvent::QueryEnd {
                duration,
                timed_out,
                ..
            } => {
                let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                self.total_query_time_ms.fetch_add(ms, Ordering::Relaxed);
                if *timed_out {
                    self.queries_timed_out.fetch_add(1, Ordering::Relaxed);
                }
            }
            ObserverEvent::Error { .. } => {
                self.errors_total.fetch_add(1, Ordering::Relaxed);
            }
            ObserverEvent::WaveEnd { .. } => {}
        }
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        if let ObserverMetric::ActiveSteps(count) = metric {
            self.peak_active_steps.fetch_max(*count, Ordering::Relaxed);
        }
    }

    fn flush(&self) {
        let snapshot = self.snapshot();
        tracing::debug!(
            queries_total = snapshot.queries_total,
            tool_calls = snapshot.tool_calls,
            failed_calls = snapshot.failed_calls,
            errors_total = snapshot.errors_total,
            "observer.metrics.flush"
        );
    }

    fn name(&self) -> &str {
        "metrics"
    }
}
