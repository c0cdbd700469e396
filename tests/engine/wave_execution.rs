use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;

use super::mock_tools::{
    CallLog, MockTool, engine, engine_config, engine_with_observer, weather_and_calculator,
};
use toolweave::StepStatus;
use toolweave::observability::MetricsObserver;
use toolweave::planner::{ArgValue, DependencyScheduler, ToolStep};
use toolweave::tools::Tool;

fn average_temperature_plan() -> Vec<ToolStep> {
    vec![
        ToolStep::new("w1", "weather").with_literal("city", "Paris"),
        ToolStep::new("w2", "weather").with_literal("city", "London"),
        ToolStep::new("calc", "calculator").with_arg(
            "expr",
            ArgValue::template("(${w1.temp}+${w2.temp})/2+10").unwrap(),
        ),
    ]
}

#[tokio::test]
async fn average_temperature_runs_in_two_waves() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let graph = engine.validate(average_temperature_plan()).unwrap();
    let waves = engine.schedule(&graph);
    assert_eq!(waves.len(), 2);
    assert_eq!(waves[0].steps, vec!["w1", "w2"]);
    assert_eq!(waves[1].steps, vec!["calc"]);

    let bundle = engine.run_graph(&graph).await;
    assert_eq!(bundle.summary().succeeded, 3);
    assert_eq!(bundle.wave_count(), 2);

    let calc = bundle.get("calc").unwrap();
    let value = calc.value.as_ref().and_then(serde_json::Value::as_f64).unwrap();
    assert!((value - 23.0).abs() < 1e-9);
    assert_eq!(
        log.args_for("calculator")[0]["expr"],
        json!("(14.8+11.2)/2+10")
    );
}

#[tokio::test]
async fn waves_concatenate_to_a_topological_order() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let graph = engine
        .validate(vec![
            ToolStep::new("sum", "calculator")
                .with_arg("expr", ArgValue::template("${avg} + ${t}").unwrap()),
            ToolStep::new("p", "weather").with_literal("city", "Paris"),
            ToolStep::new("avg", "calculator").with_arg(
                "expr",
                ArgValue::template("(${p.temp} + ${l.temp}) / 2").unwrap(),
            ),
            ToolStep::new("l", "weather").with_literal("city", "London"),
            ToolStep::new("t", "weather").with_literal("city", "Tokyo"),
        ])
        .unwrap();
    let waves = engine.schedule(&graph);
    let order = DependencyScheduler::execution_order(&waves);

    let position = |id: &str| order.iter().position(|step| *step == id).unwrap();
    for step in graph.steps() {
        for dependency in graph.dependencies_of(&step.id) {
            assert!(
                position(dependency) < position(step.id.as_str()),
                "{dependency} must precede {}",
                step.id
            );
        }
    }
    assert_eq!(order.len(), graph.len());
    assert_eq!(waves[0].steps, vec!["p", "l", "t"]);
}

#[tokio::test]
async fn rerunning_a_plan_yields_an_identical_bundle() {
    let log = CallLog::default();
    let engine = engine(weather_and_calculator(&log), &engine_config(4));

    let first = engine.run(average_temperature_plan()).await.unwrap();
    let second = engine.run(average_temperature_plan()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(log.count_for("weather"), 4);
}

#[tokio::test]
async fn parallel_and_sequential_pools_agree() {
    let log = CallLog::default();
    let parallel = engine(weather_and_calculator(&log), &engine_config(8))
        .run(average_temperature_plan())
        .await
        .unwrap();
    let sequential = engine(weather_and_calculator(&log), &engine_config(1))
        .run(average_temperature_plan())
        .await
        .unwrap();

    assert_eq!(parallel, sequential);
}

#[tokio::test]
async fn worker_pool_bounds_concurrency() {
    let plan: Vec<ToolStep> = (0..6)
        .map(|index| ToolStep::new(format!("s{index}"), "pooled"))
        .collect();

    for (limit, expected_peak) in [(1, 1), (3, 3)] {
        let log = CallLog::default();
        let pooled =
            MockTool::reply("pooled", json!({"ok": true}), &log).delayed(Duration::from_millis(40));
        let peak = pooled.peak_handle();
        let observer = Arc::new(MetricsObserver::new());
        let engine = engine_with_observer(
            vec![Box::new(pooled) as Box<dyn Tool>],
            &engine_config(limit),
            observer.clone(),
        );

        let bundle = engine.run(plan.clone()).await.unwrap();

        assert_eq!(bundle.summary().succeeded, 6);
        assert_eq!(peak.load(Ordering::SeqCst), expected_peak);
        assert_eq!(observer.snapshot().peak_active_steps, expected_peak as u64);
    }
}

#[tokio::test]
async fn independent_steps_overlap_in_time() {
    let log = CallLog::default();
    let slow =
        MockTool::reply("slow", json!({"ok": true}), &log).delayed(Duration::from_millis(200));
    let engine = engine(vec![Box::new(slow) as Box<dyn Tool>], &engine_config(4));

    let started = tokio::time::Instant::now();
    let bundle = engine
        .run(
            (0..4)
                .map(|index| ToolStep::new(format!("s{index}"), "slow"))
                .collect(),
        )
        .await
        .unwrap();

    assert!(bundle.iter().all(|result| result.status == StepStatus::Success));
    assert!(started.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn empty_plan_has_no_waves_and_no_calls() {
    let log = CallLog::default();
    let observer = Arc::new(MetricsObserver::new());
    let engine = engine_with_observer(
        weather_and_calculator(&log),
        &engine_config(4),
        observer.clone(),
    );

    let bundle = engine.run(Vec::new()).await.unwrap();

    assert!(bundle.is_empty());
    assert_eq!(bundle.wave_count(), 0);
    assert_eq!(log.count(), 0);
    let snapshot = observer.snapshot();
    assert_eq!(snapshot.queries_total, 1);
    assert_eq!(snapshot.waves_total, 0);
}

#[tokio::test]
async fn observer_sees_waves_and_tool_usage() {
    let log = CallLog::default();
    let observer = Arc::new(MetricsObserver::new());
    let engine = engine_with_observer(
        weather_and_calculator(&log),
        &engine_config(4),
        observer.clone(),
    );

    engine.run(average_temperature_plan()).await.unwrap();

    let snapshot = observer.snapshot();
    assert_eq!(snapshot.waves_total, 2);
    assert_eq!(snapshot.tool_calls, 3);
    assert_eq!(snapshot.tool_usage["weather"], 2);
    assert_eq!(snapshot.tool_usage["calculator"], 1);
    assert_eq!(snapshot.execution_sequence, vec!["weather", "calculator"]);
}
