use crate::engine::resolve::{PriorResults, resolve_args};
use crate::engine::{StepError, StepResult, StepStatus};
use crate::observability::{Observer, ObserverEvent, ObserverMetric};
use crate::planner::{PlanGraph, ToolStep, Wave};
use crate::tools::{ToolArgs, ToolRegistry};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::task::AbortOnDropHandle;

/// Runs the steps of one wave on a bounded worker pool.
pub struct StepExecutor {
    registry: Arc<ToolRegistry>,
    workers: Arc<Semaphore>,
    step_timeout: Duration,
    observer: Arc<dyn Observer>,
    active: AtomicU64,
}

/// Counts one in-flight tool call for as long as it is held and reports the
/// new total on entry and on drop, including when the call is aborted.
struct ActiveStep<'a> {
    active: &'a AtomicU64,
    observer: &'a dyn Observer,
}

impl<'a> ActiveStep<'a> {
    fn enter(active: &'a AtomicU64, observer: &'a dyn Observer) -> Self {
        let count = active.fetch_add(1, Ordering::SeqCst) + 1;
        observer.record_metric(&ObserverMetric::ActiveSteps(count));
        Self { active, observer }
    }
}

impl Drop for ActiveStep<'_> {
    fn drop(&mut self) {
        let count = self.active.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        self.observer.record_metric(&ObserverMetric::ActiveSteps(count));
    }
}

impl StepExecutor {
    pub fn new(
        registry: Arc<ToolRegistry>,
        max_parallel_steps: usize,
        step_timeout: Duration,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            registry,
            workers: Arc::new(Semaphore::new(max_parallel_steps.max(1))),
            step_timeout,
            observer,
            active: AtomicU64::new(0),
        }
    }

    /// Executes every step of `wave` and returns their results in wave order.
    ///
    /// Steps whose predecessors did not all succeed are skipped without
    /// invocation. When `deadline` passes, in-flight invocations are aborted
    /// and every unfinished step is skipped with a query timeout.
    pub async fn execute_wave(
        &self,
        graph: &PlanGraph,
        wave: &Wave,
        prior: &PriorResults,
        deadline: Instant,
    ) -> Vec<StepResult> {
        let mut finished: BTreeMap<usize, StepResult> = BTreeMap::new();
        let mut pending = FuturesUnordered::new();

        for (position, step_id) in wave.steps.iter().enumerate() {
            let Some(step) = graph.step(step_id) else {
                continue;
            };
            match self.prepare(graph, step, prior) {
                Ok(args) => pending.push(self.invoke(position, step, args)),
                Err(result) => {
                    finished.insert(position, result);
                }
            }
        }

        let expired = tokio::time::sleep_until(deadline);
        tokio::pin!(expired);

        let mut timed_out = false;
        loop {
            tokio::select! {
                biased;
                next = pending.next() => match next {
                    Some((position, result)) => {
                        finished.insert(position, result);
                    }
                    None => break,
                },
                () = &mut expired => {
                    timed_out = true;
                    break;
                }
            }
        }
        // Dropping the pending futures aborts their spawned tool tasks.
        drop(pending);

        if timed_out {
            tracing::warn!(
                wave = wave.index,
                unfinished = wave.len() - finished.len(),
                "query deadline reached; abandoning in-flight steps"
            );
        }

        wave.steps
            .iter()
            .enumerate()
            .filter_map(|(position, step_id)| {
                finished.remove(&position).or_else(|| {
                    let step = graph.step(step_id)?;
                    Some(StepResult::skipped(&step.id, &step.tool, StepError::query_timeout()))
                })
            })
            .collect()
    }

    /// Returns resolved arguments, or the terminal result when the step
    /// cannot run.
    fn prepare(
        &self,
        graph: &PlanGraph,
        step: &ToolStep,
        prior: &PriorResults,
    ) -> Result<ToolArgs, StepResult> {
        let blocked = graph.dependencies_of(&step.id).find_map(|parent| {
            match prior.get(parent).map(|result| result.status) {
                Some(StepStatus::Success) => None,
                Some(status) => Some(format!("dependency {parent} {status}")),
                None => Some(format!("dependency {parent} has no result")),
            }
        });
        if let Some(reason) = blocked {
            tracing::debug!(step = %step.id, %reason, "skipping step");
            let error = StepError::missing_dependency(reason);
            self.observer.record_event(&ObserverEvent::StepSkipped {
                step_id: step.id.clone(),
                tool: step.tool.clone(),
                reason: error.kind,
            });
            return Err(StepResult::skipped(&step.id, &step.tool, error));
        }

        resolve_args(step, prior).map_err(|error| {
            tracing::debug!(step = %step.id, %error, "placeholder did not resolve");
            self.observer.record_event(&ObserverEvent::Error {
                component: "engine.resolve".into(),
                message: format!("step {}: {}", step.id, error.message),
            });
            StepResult::failed(&step.id, &step.tool, error)
        })
    }

    async fn invoke(&self, position: usize, step: &ToolStep, args: ToolArgs) -> (usize, StepResult) {
        let Some(tool) = self.registry.get(&step.tool).cloned() else {
            let error = StepError::tool_execution(&step.tool, "tool is not registered");
            return (position, StepResult::failed(&step.id, &step.tool, error));
        };

        let Ok(_permit) = self.workers.acquire().await else {
            let error = StepError::tool_execution(&step.tool, "worker pool closed");
            return (position, StepResult::failed(&step.id, &step.tool, error));
        };

        let _active = ActiveStep::enter(&self.active, self.observer.as_ref());
        tracing::debug!(step = %step.id, tool = %step.tool, "invoking tool");
        let started = Instant::now();
        let task = AbortOnDropHandle::new(tokio::spawn(async move { tool.execute(args).await }));

        let result = match tokio::time::timeout(self.step_timeout, task).await {
            Ok(Ok(Ok(value))) => StepResult::success(&step.id, &step.tool, value),
            Ok(Ok(Err(cause))) => StepResult::failed(
                &step.id,
                &step.tool,
                StepError::tool_execution(&step.tool, format!("{cause:#}")),
            ),
            Ok(Err(join_error)) => {
                let cause = if join_error.is_panic() {
                    "tool panicked".to_string()
                } else {
                    join_error.to_string()
                };
                StepResult::failed(
                    &step.id,
                    &step.tool,
                    StepError::tool_execution(&step.tool, cause),
                )
            }
            Err(_elapsed) => StepResult::failed(
                &step.id,
                &step.tool,
                StepError::tool_timeout(&step.tool, self.step_timeout),
            ),
        };

        if let Some(error) = &result.error {
            tracing::warn!(step = %step.id, tool = %step.tool, %error, "step failed");
        }
        self.observer.record_event(&ObserverEvent::ToolCall {
            step_id: step.id.clone(),
            tool: step.tool.clone(),
            duration: started.elapsed(),
            status: result.status,
        });

        (position, result)
    }
}
