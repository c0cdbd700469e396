use super::mock_tools::{CallLog, engine, engine_config, weather_and_calculator};
use toolweave::PlanError;
use toolweave::planner::{ArgValue, PlanParser, ToolStep};

#[tokio::test]
async fn cyclic_plan_is_rejected_before_any_invocation() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let error = engine
        .run(vec![
            ToolStep::new("a", "calculator").with_arg("expr", ArgValue::template("${c} + 1").unwrap()),
            ToolStep::new("b", "calculator").with_arg("expr", ArgValue::template("${a} + 1").unwrap()),
            ToolStep::new("c", "calculator").with_arg("expr", ArgValue::template("${b} + 1").unwrap()),
        ])
        .await
        .unwrap_err();

    match error {
        PlanError::CyclicDependency { cycle } => {
            assert!(cycle.len() >= 3);
            assert_eq!(cycle.first(), cycle.last());
        }
        other => panic!("expected cycle, got {other:?}"),
    }
    assert_eq!(log.count(), 0);
}

#[tokio::test]
async fn depends_on_cycle_is_rejected() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let error = engine
        .run(vec![
            ToolStep::new("w1", "weather").with_literal("city", "Paris").after("w2"),
            ToolStep::new("w2", "weather").with_literal("city", "London").after("w1"),
        ])
        .await
        .unwrap_err();

    assert!(error.is_cyclic());
    assert_eq!(log.count(), 0);
}

#[tokio::test]
async fn self_reference_is_malformed() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let error = engine
        .run(vec![
            ToolStep::new("calc", "calculator").with_reference("expr", "calc", "value"),
        ])
        .await
        .unwrap_err();

    assert_eq!(
        error,
        PlanError::SelfReference {
            step: "calc".into()
        }
    );
    assert!(error.is_malformed());
    assert_eq!(log.count(), 0);
}

#[tokio::test]
async fn undefined_reference_is_malformed() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let error = engine
        .run(vec![
            ToolStep::new("w1", "weather").with_literal("city", "Paris"),
            ToolStep::new("calc", "calculator").with_reference("expr", "w9", "temp"),
        ])
        .await
        .unwrap_err();

    assert_eq!(
        error,
        PlanError::UnknownStep {
            step: "calc".into(),
            reference: "w9".into()
        }
    );
    assert_eq!(log.count(), 0);
}

#[tokio::test]
async fn unknown_tool_is_malformed() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let error = engine
        .run(vec![ToolStep::new("s", "stock_quote")])
        .await
        .unwrap_err();

    assert!(matches!(error, PlanError::UnknownTool { ref tool, .. } if tool == "stock_quote"));
}

#[tokio::test]
async fn duplicate_ids_are_malformed() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let error = engine
        .run(vec![
            ToolStep::new("w", "weather").with_literal("city", "Paris"),
            ToolStep::new("w", "weather").with_literal("city", "London"),
        ])
        .await
        .unwrap_err();

    assert_eq!(error, PlanError::DuplicateStepId("w".into()));
    assert_eq!(log.count(), 0);
}

#[test]
fn malformed_placeholder_is_rejected_at_parse_time() {
    let error = PlanParser::parse(
        r#"[{"id": "calc", "tool": "calculator", "args": {"expr": "${w1.temp + 1"}}]"#,
    )
    .unwrap_err();
    assert!(matches!(error, PlanError::InvalidPlaceholder { ref step, .. } if step == "calc"));
}

#[tokio::test]
async fn parsed_plan_without_ids_keeps_tool_name_references() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let steps = PlanParser::parse(
        r#"[
            {"tool": "weather", "args": {"city": "Paris"}},
            {"tool": "calculator", "args": {"expr": "${weather.temp} * 2"}, "depends_on": ["weather"]}
        ]"#,
    )
    .unwrap();
    let graph = engine.validate(steps).unwrap();
    let waves = engine.schedule(&graph);

    assert_eq!(waves.len(), 2);
    assert_eq!(waves[0].steps, vec!["weather"]);
    assert_eq!(waves[1].steps, vec!["calculator"]);
}
