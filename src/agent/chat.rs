//! Client for OpenAI-compatible `/chat/completions` endpoints.
//! Shared by the model-backed planner and fuser.

use crate::config::ModelConfig;
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_API_ERROR_CHARS: usize = 200;

pub struct ChatClient {
    model: String,
    temperature: f64,
    api_key: Option<String>,
    /// Pre-computed chat completions URL.
    chat_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Keeps provider error bodies short and drops anything after a bearer
/// token or key marker.
fn sanitize_api_error(input: &str) -> String {
    let mut text = input.to_string();
    for marker in ["Bearer ", "bearer ", "api_key=", "\"api_key\":\""] {
        if let Some(start) = text.find(marker) {
            text.truncate(start + marker.len());
            text.push_str("[REDACTED]");
        }
    }

    if text.chars().count() <= MAX_API_ERROR_CHARS {
        return text;
    }
    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

impl ChatClient {
    pub fn new(config: &ModelConfig) -> Self {
        let base_url = config.base_url.trim_end_matches('/');
        let chat_url = if base_url.ends_with("chat/completions") {
            base_url.to_string()
        } else {
            format!("{base_url}/chat/completions")
        };

        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            chat_url,
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// One system + user exchange; returns the first choice's text.
    pub async fn complete(&self, system_prompt: &str, message: &str) -> anyhow::Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            anyhow::bail!("model API key not set. Set OPENAI_API_KEY or [model].api_key.");
        };

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: message,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.chat_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("{} chat completions request failed", self.model))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "{} API error ({status}): {}",
                self.model,
                sanitize_api_error(&body)
            );
        }

        let chat: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("{} chat completions JSON decode failed", self.model))?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("No response from {}", self.model))?;
        tracing::debug!(model = %self.model, chars = text.len(), "chat completion received");
        Ok(text)
    }
}
