use crate::engine::ResultBundle;
use crate::planner::ToolStep;
use std::future::Future;
use std::pin::Pin;

/// Turns a user query into a tool plan.
///
/// Output is untrusted: the engine validates every plan before running it.
pub trait Planner: Send + Sync {
    fn name(&self) -> &str;

    fn plan<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<ToolStep>>> + Send + 'a>>;
}

/// Turns a query and its tool results into the final answer text.
pub trait Fuser: Send + Sync {
    fn name(&self) -> &str;

    fn fuse<'a>(
        &'a self,
        query: &'a str,
        bundle: &'a ResultBundle,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}
