use serde_json::json;

use super::mock_tools::{
    CallLog, LoggedCalculator, MockTool, engine, engine_config, weather_and_calculator,
};
use toolweave::engine::{StepError, StepErrorKind};
use toolweave::planner::{ArgValue, ToolStep};
use toolweave::tools::Tool;
use toolweave::StepStatus;

#[tokio::test]
async fn failed_weather_skips_the_calculator() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let bundle = engine
        .run(vec![
            ToolStep::new("w1", "weather").with_literal("city", "Paris"),
            ToolStep::new("w2", "weather").with_literal("city", "Atlantis"),
            ToolStep::new("calc", "calculator").with_arg(
                "expr",
                ArgValue::template("(${w1.temp}+${w2.temp})/2+10").unwrap(),
            ),
        ])
        .await
        .unwrap();

    assert!(bundle.get("w1").unwrap().is_success());

    let w2 = bundle.get("w2").unwrap();
    assert_eq!(w2.status, StepStatus::Failed);
    assert_eq!(
        w2.error.as_ref().unwrap(),
        &StepError::tool_execution("weather", "city 'Atlantis' not found")
    );

    let calc = bundle.get("calc").unwrap();
    assert_eq!(calc.status, StepStatus::Skipped);
    assert_eq!(calc.error_kind(), Some(StepErrorKind::MissingDependency));
    assert_eq!(log.count_for("calculator"), 0);
    assert!(!bundle.all_failed());
}

#[tokio::test]
async fn failure_skips_every_transitive_dependent() {
    let log = CallLog::default();
    let tools: Vec<Box<dyn Tool>> = vec![
        Box::new(MockTool::failing("source", "upstream unavailable", &log)),
        Box::new(MockTool::reply("side", json!({"n": 2}), &log)),
        Box::new(LoggedCalculator::new(&log)),
    ];
    let engine = engine(tools, &engine_config(4));

    let bundle = engine
        .run(vec![
            ToolStep::new("root", "source"),
            ToolStep::new("side", "side"),
            ToolStep::new("mid", "calculator").with_reference("expr", "root", "n"),
            ToolStep::new("leaf", "calculator")
                .with_arg("expr", ArgValue::template("${mid} + ${side.n}").unwrap()),
            ToolStep::new("ordered", "calculator")
                .with_literal("expr", "1 + 1")
                .after("leaf"),
            ToolStep::new("free", "calculator").with_reference("expr", "side", "n"),
        ])
        .await
        .unwrap();

    assert_eq!(bundle.get("root").unwrap().status, StepStatus::Failed);
    for id in ["mid", "leaf", "ordered"] {
        let result = bundle.get(id).unwrap();
        assert_eq!(result.status, StepStatus::Skipped, "{id}");
        assert_eq!(result.error_kind(), Some(StepErrorKind::MissingDependency));
    }
    assert!(bundle.get("side").unwrap().is_success());
    assert_eq!(bundle.get("free").unwrap().value, Some(json!(2)));
    // Only `free` reached the calculator.
    assert_eq!(log.count_for("calculator"), 1);
}

#[tokio::test]
async fn missing_field_fails_the_consumer_without_invoking_it() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let bundle = engine
        .run(vec![
            ToolStep::new("w1", "weather").with_literal("city", "Paris"),
            ToolStep::new("calc", "calculator").with_reference("expr", "w1", "pressure"),
        ])
        .await
        .unwrap();

    let calc = bundle.get("calc").unwrap();
    assert_eq!(calc.status, StepStatus::Failed);
    assert_eq!(
        calc.error.as_ref().unwrap(),
        &StepError::missing_dependency("step w1 output has no field 'pressure'")
    );
    assert_eq!(log.count_for("calculator"), 0);
}

#[tokio::test]
async fn panicking_tool_is_contained() {
    let log = CallLog::default();
    let tools: Vec<Box<dyn Tool>> = vec![
        Box::new(MockTool::panicking("volatile", &log)),
        Box::new(MockTool::reply("steady", json!("fine"), &log)),
    ];
    let engine = engine(tools, &engine_config(2));

    let bundle = engine
        .run(vec![
            ToolStep::new("v", "volatile"),
            ToolStep::new("s", "steady"),
        ])
        .await
        .unwrap();

    let volatile = bundle.get("v").unwrap();
    assert_eq!(volatile.status, StepStatus::Failed);
    assert_eq!(
        volatile.error.as_ref().unwrap(),
        &StepError::tool_execution("volatile", "tool panicked")
    );
    assert_eq!(bundle.get("s").unwrap().value, Some(json!("fine")));
}

#[tokio::test]
async fn every_step_failing_is_flagged_on_the_bundle() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let bundle = engine
        .run(vec![
            ToolStep::new("w", "weather").with_literal("city", "Atlantis"),
            ToolStep::new("calc", "calculator").with_reference("expr", "w", "temp"),
        ])
        .await
        .unwrap();

    let summary = bundle.summary();
    assert_eq!((summary.failed, summary.skipped), (1, 1));
    assert!(bundle.all_failed());
}
