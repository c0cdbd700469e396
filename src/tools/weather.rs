use super::traits::{Tool, ToolArgs, ToolFuture, round1, string_arg};
use crate::config::WeatherToolConfig;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("WEATHER_API_KEY is required for the weather tool")]
    MissingApiKey,

    #[error("city parameter is required")]
    MissingCity,

    #[error("city '{0}' not found")]
    CityNotFound(String),

    #[error("weather API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("invalid weather data format: {0}")]
    InvalidResponse(String),

    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Subset of the OpenWeatherMap current-weather payload.
#[derive(Debug, Deserialize)]
struct WeatherPayload {
    #[serde(default)]
    name: Option<String>,
    main: MainData,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    wind: Option<WindData>,
}

#[derive(Debug, Deserialize)]
struct MainData {
    /// Kelvin
    temp: f64,
    humidity: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct WindData {
    speed: f64,
}

/// Current conditions for a city through an OpenWeatherMap-compatible API.
pub struct WeatherTool {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl WeatherTool {
    pub fn new(config: &WeatherToolConfig) -> Self {
        Self {
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            base_url: config.base_url.clone(),
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    async fn lookup(&self, args: &ToolArgs) -> Result<Value, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;
        let city = string_arg(args, "city").ok_or(WeatherError::MissingCity)?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", city), ("appid", api_key)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::CityNotFound(city.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: WeatherPayload = response
            .json()
            .await
            .map_err(|error| WeatherError::InvalidResponse(error.to_string()))?;
        Ok(Self::report(city, payload))
    }

    fn report(requested_city: &str, payload: WeatherPayload) -> Value {
        let city = payload
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| requested_city.to_string());
        let temp = round1(payload.main.temp - KELVIN_OFFSET);
        let description = payload
            .weather
            .first()
            .map_or_else(|| "unknown".to_string(), |c| c.description.clone());
        let wind_speed = payload.wind.map(|wind| wind.speed);

        let mut summary = format!("{city}: {temp}°C, {description}");
        if let Some(humidity) = payload.main.humidity {
            summary.push_str(&format!(", humidity {humidity}%"));
        }
        if let Some(speed) = wind_speed {
            summary.push_str(&format!(", wind {speed} m/s"));
        }

        json!({
            "city": city,
            "temp": temp,
            "description": description,
            "humidity": payload.main.humidity,
            "wind_speed": wind_speed,
            "summary": summary,
        })
    }
}

impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Current weather for a city; returns temp (°C), description, humidity, wind_speed"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City name, e.g. \"Paris\""
                }
            },
            "required": ["city"]
        })
    }

    fn execute<'a>(&'a self, args: ToolArgs) -> ToolFuture<'a> {
        Box::pin(async move { Ok(self.lookup(&args).await?) })
    }
}
