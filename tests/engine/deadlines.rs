use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::mock_tools::{CallLog, LoggedCalculator, MockTool, engine, engine_with_observer};
use toolweave::StepStatus;
use toolweave::config::EngineConfig;
use toolweave::engine::StepErrorKind;
use toolweave::observability::MetricsObserver;
use toolweave::planner::ToolStep;
use toolweave::tools::Tool;

fn config(step_timeout_ms: u64, query_timeout_ms: u64) -> EngineConfig {
    EngineConfig {
        max_parallel_steps: 4,
        step_timeout_ms,
        query_timeout_ms,
    }
}

#[tokio::test]
async fn slow_tool_times_out_and_its_dependents_are_skipped() {
    let log = CallLog::default();
    let tools: Vec<Box<dyn Tool>> = vec![
        Box::new(
            MockTool::reply("sluggish", json!({"v": 1}), &log).delayed(Duration::from_secs(5)),
        ),
        Box::new(MockTool::reply("quick", json!({"v": 2}), &log)),
        Box::new(LoggedCalculator::new(&log)),
    ];
    let engine = engine(tools, &config(100, 10_000));

    let bundle = engine
        .run(vec![
            ToolStep::new("slow", "sluggish"),
            ToolStep::new("fast", "quick"),
            ToolStep::new("calc", "calculator").with_reference("expr", "slow", "v"),
        ])
        .await
        .unwrap();

    let slow = bundle.get("slow").unwrap();
    assert_eq!(slow.status, StepStatus::Failed);
    assert_eq!(slow.error_kind(), Some(StepErrorKind::ToolTimeout));
    assert_eq!(
        slow.error.as_ref().unwrap().message,
        "sluggish timed out after 100ms"
    );
    assert!(bundle.get("fast").unwrap().is_success());
    assert_eq!(
        bundle.get("calc").unwrap().error_kind(),
        Some(StepErrorKind::MissingDependency)
    );
    assert_eq!(log.count_for("calculator"), 0);
}

#[tokio::test]
async fn query_deadline_keeps_completed_results() {
    let log = CallLog::default();
    let tools: Vec<Box<dyn Tool>> = vec![
        Box::new(MockTool::reply("quick", json!({"v": 2}), &log)),
        Box::new(
            MockTool::reply("stalled", json!({"v": 1}), &log).delayed(Duration::from_secs(10)),
        ),
        Box::new(LoggedCalculator::new(&log)),
    ];
    let observer = Arc::new(MetricsObserver::new());
    let engine = engine_with_observer(tools, &config(30_000, 150), observer.clone());

    let started = tokio::time::Instant::now();
    let bundle = engine
        .run(vec![
            ToolStep::new("done", "quick"),
            ToolStep::new("stuck", "stalled"),
            ToolStep::new("after", "calculator").with_reference("expr", "stuck", "v"),
        ])
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(bundle.get("done").unwrap().value, Some(json!({"v": 2})));
    for id in ["stuck", "after"] {
        let result = bundle.get(id).unwrap();
        assert_eq!(result.status, StepStatus::Skipped, "{id}");
        assert_eq!(result.error_kind(), Some(StepErrorKind::QueryTimeout));
    }
    assert_eq!(bundle.len(), 3);
    assert_eq!(log.count_for("calculator"), 0);
    assert_eq!(observer.snapshot().queries_timed_out, 1);
}
