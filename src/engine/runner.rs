use crate::config::EngineConfig;
use crate::engine::resolve::PriorResults;
use crate::engine::{ResultAggregator, ResultBundle, StepErrorKind, StepExecutor};
use crate::error::PlanError;
use crate::observability::{Observer, ObserverEvent, ObserverMetric};
use crate::planner::{DependencyScheduler, PlanGraph, ToolStep, Wave};
use crate::tools::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Validates a plan and drives its waves to a [`ResultBundle`].
///
/// Waves run strictly one after another; steps inside a wave share the
/// executor's worker pool. A rejected plan never invokes a tool.
pub struct PlanEngine {
    registry: Arc<ToolRegistry>,
    executor: StepExecutor,
    query_timeout: Duration,
    observer: Arc<dyn Observer>,
}

impl PlanEngine {
    pub fn new(
        registry: Arc<ToolRegistry>,
        config: &EngineConfig,
        observer: Arc<dyn Observer>,
    ) -> Self {
        let executor = StepExecutor::new(
            Arc::clone(&registry),
            config.max_parallel_steps,
            config.step_timeout(),
            Arc::clone(&observer),
        );
        Self {
            registry,
            executor,
            query_timeout: config.query_timeout(),
            observer,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Checks references, tool names and acyclicity against the registry.
    pub fn validate(&self, steps: Vec<ToolStep>) -> Result<PlanGraph, PlanError> {
        PlanGraph::validate(steps, self.registry.as_ref()).inspect_err(|error| {
            tracing::warn!(%error, "plan rejected");
            self.observer.record_event(&ObserverEvent::PlanRejected {
                reason: error.to_string(),
            });
        })
    }

    pub fn schedule(&self, graph: &PlanGraph) -> Vec<Wave> {
        DependencyScheduler::schedule(graph)
    }

    /// Validates and executes a plan.
    pub async fn run(&self, steps: Vec<ToolStep>) -> Result<ResultBundle, PlanError> {
        let graph = self.validate(steps)?;
        Ok(self.run_graph(&graph).await)
    }

    /// Executes an already validated plan.
    pub async fn run_graph(&self, graph: &PlanGraph) -> ResultBundle {
        let query_id = uuid::Uuid::new_v4().to_string();
        let waves = self.schedule(graph);
        let started = Instant::now();
        let deadline = started + self.query_timeout;

        self.observer.record_event(&ObserverEvent::QueryStart {
            query_id: query_id.clone(),
            steps: graph.len(),
            waves: waves.len(),
        });
        tracing::info!(
            query_id = %query_id,
            steps = graph.len(),
            waves = waves.len(),
            "executing plan"
        );

        let mut prior = PriorResults::new();
        let mut waves_run = 0_u64;

        for wave in &waves {
            if Instant::now() >= deadline {
                break;
            }

            self.observer.record_event(&ObserverEvent::WaveStart {
                index: wave.index,
                steps: wave.len(),
            });
            let wave_started = Instant::now();

            let results = self
                .executor
                .execute_wave(graph, wave, &prior, deadline)
                .await;
            waves_run += 1;

            self.observer.record_event(&ObserverEvent::WaveEnd {
                index: wave.index,
                duration: wave_started.elapsed(),
            });

            for result in results {
                prior.insert(result.step_id.clone(), result);
            }
        }

        let bundle = ResultAggregator::aggregate(graph, prior.into_values(), waves.len());
        let timed_out = bundle
            .iter()
            .any(|result| result.error_kind() == Some(StepErrorKind::QueryTimeout));
        if timed_out {
            tracing::warn!(
                query_id = %query_id,
                completed_waves = waves_run,
                "query deadline exceeded"
            );
        }

        let duration = started.elapsed();
        self.observer.record_event(&ObserverEvent::QueryEnd {
            query_id: query_id.clone(),
            duration,
            summary: bundle.summary(),
            timed_out,
        });
        self.observer
            .record_metric(&ObserverMetric::QueryLatency(duration));
        self.observer
            .record_metric(&ObserverMetric::WaveCount(waves_run));

        let summary = bundle.summary();
        tracing::info!(
            query_id = %query_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "plan finished"
        );
        bundle
    }
}
