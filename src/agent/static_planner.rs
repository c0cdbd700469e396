use super::traits::Planner;
use crate::planner::{PlanParser, ToolStep};
use anyhow::Context;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

/// Serves a fixed plan, ignoring the query.
///
/// The text goes through [`PlanParser::parse_response`], so it may be raw
/// JSON or a model response with the plan in a code fence.
#[derive(Debug, Clone)]
pub struct StaticPlanner {
    plan_text: String,
}

impl StaticPlanner {
    pub fn new(plan_text: impl Into<String>) -> Self {
        Self {
            plan_text: plan_text.into(),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file {}", path.display()))?;
        Ok(Self::new(text))
    }

    pub fn plan_text(&self) -> &str {
        &self.plan_text
    }
}

impl Planner for StaticPlanner {
    fn name(&self) -> &str {
        "static"
    }

    fn plan<'a>(
        &'a self,
        _query: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<ToolStep>>> + Send + 'a>> {
        Box::pin(async move { Ok(PlanParser::parse_response(&self.plan_text)?) })
    }
}
