use super::traits::{Fuser, Planner};
use crate::engine::{PlanEngine, ResultBundle};
use crate::error::{AgentError, PlanError};
use std::sync::Arc;

/// Final output of one query.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub bundle: ResultBundle,
}

/// Plan, execute, fuse.
pub struct Agent {
    planner: Arc<dyn Planner>,
    engine: PlanEngine,
    fuser: Arc<dyn Fuser>,
}

impl Agent {
    pub fn new(planner: Arc<dyn Planner>, engine: PlanEngine, fuser: Arc<dyn Fuser>) -> Self {
        Self {
            planner,
            engine,
            fuser,
        }
    }

    pub fn engine(&self) -> &PlanEngine {
        &self.engine
    }

    /// Runs one query end to end.
    ///
    /// Fusion sees partial results. Only a non-empty plan in which no step
    /// succeeded is turned into [`AgentError::AllStepsFailed`].
    pub async fn answer(&self, query: &str) -> Result<Answer, AgentError> {
        let steps = self.planner.plan(query).await.map_err(|error| {
            match error.downcast::<PlanError>() {
                Ok(plan_error) => AgentError::Plan(plan_error),
                Err(other) => AgentError::Planning {
                    planner: self.planner.name().to_string(),
                    message: format!("{other:#}"),
                },
            }
        })?;
        tracing::debug!(planner = self.planner.name(), steps = steps.len(), "plan received");

        let bundle = self.engine.run(steps).await?;

        let summary = bundle.summary();
        if summary.all_failed() {
            return Err(AgentError::AllStepsFailed {
                failed: summary.failed,
                skipped: summary.skipped,
            });
        }

        let text = self
            .fuser
            .fuse(query, &bundle)
            .await
            .map_err(|error| AgentError::Fusion(format!("{error:#}")))?;

        Ok(Answer { text, bundle })
    }
}
