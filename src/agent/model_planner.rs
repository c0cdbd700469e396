use super::chat::ChatClient;
use super::traits::Planner;
use crate::planner::{PlanParser, ToolStep};
use std::fmt::Write;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Asks a chat model for a plan over the registered tools.
///
/// The reply goes through [`PlanParser::parse_response`]; a parse failure
/// surfaces as a [`PlanError`](crate::error::PlanError).
pub struct ModelPlanner {
    client: Arc<ChatClient>,
    system_prompt: String,
}

impl ModelPlanner {
    /// `tools` holds (`name`, description) pairs, usually from
    /// [`tool_descriptions`](crate::tools::tool_descriptions).
    pub fn new(client: Arc<ChatClient>, tools: &[(String, String)]) -> Self {
        Self {
            client,
            system_prompt: build_system_prompt(tools),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

fn build_system_prompt(tools: &[(String, String)]) -> String {
    let mut prompt = String::from(
        "You plan tool calls that answer the user's question. \
         Independent steps run in parallel, so only add a dependency when a step \
         needs another step's output.\n\nAvailable tools:\n",
    );
    for (name, description) in tools {
        let _ = writeln!(prompt, "- {name}: {description}");
    }
    prompt.push('\n');
    prompt.push_str(PlanParser::schema_prompt());
    prompt
}

impl Planner for ModelPlanner {
    fn name(&self) -> &str {
        self.client.model()
    }

    fn plan<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<ToolStep>>> + Send + 'a>> {
        Box::pin(async move {
            let reply = self.client.complete(&self.system_prompt, query).await?;
            if reply.trim().is_empty() {
                tracing::debug!("planner model returned no text; treating as empty plan");
                return Ok(Vec::new());
            }
            Ok(PlanParser::parse_response(&reply)?)
        })
    }
}
