use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use toolweave::agent::{Agent, ChatClient, ModelFuser, ModelPlanner};
use toolweave::config::Config;
use toolweave::engine::PlanEngine;
use toolweave::error::AgentError;
use toolweave::observability::NoopObserver;
use toolweave::tools::{default_tools, tool_descriptions};

const AVERAGE_PLAN: &str = "```json\n[\
    {\"id\": \"w1\", \"tool\": \"weather\", \"args\": {\"city\": \"Paris\"}},\
    {\"id\": \"w2\", \"tool\": \"weather\", \"args\": {\"city\": \"London\"}},\
    {\"id\": \"calc\", \"tool\": \"calculator\", \"args\": {\"expr\": \"(${w1.temp}+${w2.temp})/2+10\"}}\
]\n```";

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

async fn mount_planner(model: &MockServer, plan: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Available tools:"))
        .respond_with(chat_reply(plan))
        .expect(1)
        .mount(model)
        .await;
}

async fn mount_weather(server: &MockServer, city: &str, kelvin: f64) {
    Mock::given(method("GET"))
        .and(query_param("q", city))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": city,
            "main": {"temp": kelvin, "humidity": 70},
            "weather": [{"description": "overcast clouds"}]
        })))
        .mount(server)
        .await;
}

fn config_for(model: &MockServer, weather: &MockServer) -> Config {
    let mut config = Config::default();
    config.model.base_url = model.uri();
    config.model.api_key = Some("sk-test".into());
    config.model.model = "test-model".into();
    config.tools.weather.api_key = Some("weather-key".into());
    config.tools.weather.base_url = weather.uri();
    config.tools.knowledge_base.enabled = false;
    config
}

fn model_agent(config: &Config) -> Agent {
    let registry = Arc::new(default_tools(&config.tools).unwrap());
    let client = Arc::new(ChatClient::new(&config.model));
    let planner = ModelPlanner::new(Arc::clone(&client), &tool_descriptions(&registry));
    let engine = PlanEngine::new(registry, &config.engine, Arc::new(NoopObserver));
    Agent::new(Arc::new(planner), engine, Arc::new(ModelFuser::new(client)))
}

#[tokio::test]
async fn question_is_planned_executed_and_fused() {
    let model = MockServer::start().await;
    let weather = MockServer::start().await;
    mount_weather(&weather, "Paris", 287.95).await;
    mount_weather(&weather, "London", 284.35).await;
    mount_planner(&model, AVERAGE_PLAN).await;
    Mock::given(method("POST"))
        .and(body_string_contains("- calc (calculator): 23"))
        .respond_with(chat_reply("23°C"))
        .expect(1)
        .mount(&model)
        .await;

    let answer = model_agent(&config_for(&model, &weather))
        .answer("Add 10 to the average temperature in Paris and London")
        .await
        .unwrap();

    assert_eq!(answer.text, "23°C");
    assert_eq!(answer.bundle.summary().succeeded, 3);
    assert_eq!(answer.bundle.wave_count(), 2);
}

#[tokio::test]
async fn partial_failure_reaches_the_fusion_model() {
    let model = MockServer::start().await;
    let weather = MockServer::start().await;
    mount_weather(&weather, "Paris", 287.95).await;
    Mock::given(method("GET"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&weather)
        .await;
    mount_planner(&model, AVERAGE_PLAN).await;
    Mock::given(method("POST"))
        .and(body_string_contains("Unavailable:"))
        .and(body_string_contains("city 'London' not found"))
        .and(body_string_contains("calc (calculator) skipped"))
        .respond_with(chat_reply(
            "Paris is 14.8°C. London's temperature is unavailable, so no average.",
        ))
        .expect(1)
        .mount(&model)
        .await;

    let answer = model_agent(&config_for(&model, &weather))
        .answer("Add 10 to the average temperature in Paris and London")
        .await
        .unwrap();

    let summary = answer.bundle.summary();
    assert_eq!(
        (summary.succeeded, summary.failed, summary.skipped),
        (1, 1, 1)
    );
    assert!(answer.text.starts_with("Paris is 14.8°C."));
}

#[tokio::test]
async fn unknown_tool_in_model_plan_is_rejected_before_execution() {
    let model = MockServer::start().await;
    let weather = MockServer::start().await;
    mount_planner(
        &model,
        r#"[{"id": "t", "tool": "teleport", "args": {"to": "Mars"}}]"#,
    )
    .await;

    let error = model_agent(&config_for(&model, &weather))
        .answer("take me to Mars")
        .await
        .unwrap_err();

    assert!(matches!(error, AgentError::Plan(ref plan) if plan.is_malformed()));
    assert!(weather.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn model_outage_names_the_planner() {
    let model = MockServer::start().await;
    let weather = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&model)
        .await;

    let error = model_agent(&config_for(&model, &weather))
        .answer("What is 2 + 2?")
        .await
        .unwrap_err();

    match error {
        AgentError::Planning { planner, message } => {
            assert_eq!(planner, "test-model");
            assert!(message.contains("503"));
            assert!(message.contains("overloaded"));
        }
        other => panic!("expected a planning error, got {other:?}"),
    }
}
