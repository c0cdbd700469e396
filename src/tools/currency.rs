use super::traits::{Tool, ToolArgs, ToolFuture, number_arg, number_value, string_arg};
use crate::config::CurrencyToolConfig;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("currency code must be exactly 3 letters: '{0}'")]
    InvalidCode(String),

    #[error("amount must be a positive number")]
    InvalidAmount,

    #[error("invalid currency code provided")]
    UnknownCurrency,

    #[error("conversion rate not found for {0}")]
    RateNotFound(String),

    #[error("currency API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("invalid API response format: {0}")]
    InvalidResponse(String),

    #[error("currency conversion failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Frankfurter `/latest` response.
#[derive(Debug, Deserialize)]
struct RatesPayload {
    amount: f64,
    date: String,
    rates: HashMap<String, f64>,
}

#[derive(Debug, PartialEq)]
struct Conversion {
    amount: f64,
    from: String,
    to: String,
}

fn currency_code(args: &ToolArgs, name: &'static str) -> Result<String, CurrencyError> {
    let code = string_arg(args, name).ok_or(CurrencyError::MissingParameter(name))?;
    if code.len() != 3 || !code.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(CurrencyError::InvalidCode(code.to_string()));
    }
    Ok(code.to_ascii_uppercase())
}

impl Conversion {
    fn from_args(args: &ToolArgs) -> Result<Self, CurrencyError> {
        let from = currency_code(args, "from")?;
        let to = currency_code(args, "to")?;
        if !args.contains_key("amount") {
            return Err(CurrencyError::MissingParameter("amount"));
        }
        let amount = number_arg(args, "amount")
            .filter(|amount| amount.is_finite() && *amount > 0.0)
            .ok_or(CurrencyError::InvalidAmount)?;
        Ok(Self { amount, from, to })
    }
}

/// Currency conversion through a Frankfurter-compatible rates API.
pub struct CurrencyConverterTool {
    base_url: String,
    client: Client,
}

impl CurrencyConverterTool {
    pub fn new(config: &CurrencyToolConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    async fn convert(&self, args: &ToolArgs) -> Result<Value, CurrencyError> {
        let request = Conversion::from_args(args)?;
        let amount = request.amount.to_string();

        let response = self
            .client
            .get(format!("{}/latest", self.base_url))
            .query(&[
                ("amount", amount.as_str()),
                ("from", request.from.as_str()),
                ("to", request.to.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
            return Err(CurrencyError::UnknownCurrency);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CurrencyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: RatesPayload = response
            .json()
            .await
            .map_err(|error| CurrencyError::InvalidResponse(error.to_string()))?;
        if !(payload.amount.is_finite() && payload.amount > 0.0) {
            return Err(CurrencyError::InvalidResponse(format!(
                "non-positive amount {}",
                payload.amount
            )));
        }

        let converted = payload
            .rates
            .get(&request.to)
            .copied()
            .filter(|converted| *converted > 0.0)
            .ok_or_else(|| CurrencyError::RateNotFound(request.to.clone()))?;
        let rate = converted / payload.amount;

        Ok(json!({
            "amount": number_value(request.amount),
            "from": request.from,
            "to": request.to,
            "converted": number_value(converted),
            "rate": number_value(rate),
            "date": payload.date,
        }))
    }
}

impl Tool for CurrencyConverterTool {
    fn name(&self) -> &str {
        "currency_converter"
    }

    fn description(&self) -> &str {
        "Convert an amount between currencies using the latest exchange rates"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "from": {"type": "string", "description": "Source currency code, e.g. USD"},
                "to": {"type": "string", "description": "Target currency code, e.g. EUR"},
                "amount": {"type": "number", "description": "Positive amount to convert"}
            },
            "required": ["from", "to", "amount"]
        })
    }

    fn execute<'a>(&'a self, args: ToolArgs) -> ToolFuture<'a> {
        Box::pin(async move { Ok(self.convert(&args).await?) })
    }
}
