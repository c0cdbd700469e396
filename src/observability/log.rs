use super::traits::{Observer, ObserverEvent, ObserverMetric};
use std::time::Duration;
use tracing::{debug, info, warn};

fn millis(duration: &Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Observer that writes structured events through `tracing`.
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::QueryStart {
                query_id,
                steps,
                waves,
            } => {
                info!(query_id = %query_id, steps, waves, "query.start");
            }
            ObserverEvent::PlanRejected { reason } => {
                warn!(reason = %reason, "plan.rejected");
            }
            ObserverEvent::WaveStart { index, steps } => {
                info!(wave = index, steps, "wave.start");
            }
            ObserverEvent::WaveEnd { index, duration } => {
                info!(wave = index, duration_ms = millis(duration), "wave.end");
            }
            ObserverEvent::ToolCall {
                step_id,
                tool,
                duration,
                status,
            } => {
                info!(
                    step = %step_id,
                    tool = %tool,
                    duration_ms = millis(duration),
                    status = %status,
                    "tool.call"
                );
            }
            ObserverEvent::StepSkipped {
                step_id,
                tool,
                reason,
            } => {
                info!(step = %step_id, tool = %tool, reason = %reason, "step.skipped");
            }
            ObserverEvent::QueryEnd {
                query_id,
                duration,
                summary,
                timed_out,
            } => {
                info!(
                    query_id = %query_id,
                    duration_ms = millis(duration),
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    skipped = summary.skipped,
                    timed_out,
                    "query.end"
                );
            }
            ObserverEvent::Error { component, message } => {
                info!(component = %component, error = %message, "error");
            }
        }
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        match metric {
            ObserverMetric::QueryLatency(d) => {
                info!(latency_ms = millis(d), "metric.query_latency");
            }
            ObserverMetric::WaveCount(count) => {
                info!(waves = count, "metric.wave_count");
            }
            ObserverMetric::ActiveSteps(count) => {
                debug!(active = count, "metric.active_steps");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
