use super::chat::ChatClient;
use super::fuser::BundleFuser;
use super::traits::Fuser;
use crate::engine::ResultBundle;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

const FUSION_PROMPT: &str = "\
You write the final answer to a user's question from tool results.
Use only the results you are given. Do not mention tool names or step ids.
Calculations: reply with the number alone.
Weather: give the temperature with its unit and the conditions.
Currency: give the converted amount followed by the currency code.
Facts: one or two short sentences.
If some results are listed as unavailable, answer what you can and say briefly \
which part could not be answered.";

/// Fuses a [`ResultBundle`] into prose through a chat model.
///
/// The model sees the same listing [`BundleFuser`] renders, unavailable
/// steps included, so partial results stay visible.
pub struct ModelFuser {
    client: Arc<ChatClient>,
}

impl ModelFuser {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

impl Fuser for ModelFuser {
    fn name(&self) -> &str {
        self.client.model()
    }

    fn fuse<'a>(
        &'a self,
        query: &'a str,
        bundle: &'a ResultBundle,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let listing = BundleFuser::render(query, bundle);
            let answer = self.client.complete(FUSION_PROMPT, &listing).await?;
            let answer = answer.trim();
            if answer.is_empty() {
                anyhow::bail!("{} returned an empty answer", self.client.model());
            }
            Ok(answer.to_string())
        })
    }
}
