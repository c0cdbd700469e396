#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use toolweave::config::EngineConfig;
use toolweave::engine::PlanEngine;
use toolweave::observability::{NoopObserver, Observer};
use toolweave::tools::{CalculatorTool, Tool, ToolArgs, ToolFuture, ToolRegistry};

/// Shared record of `(tool, args)` for every invocation, in call order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(String, ToolArgs)>>>);

impl CallLog {
    pub fn record(&self, tool: &str, args: &ToolArgs) {
        self.0
            .lock()
            .expect("call log poisoned")
            .push((tool.to_string(), args.clone()));
    }

    pub fn count(&self) -> usize {
        self.0.lock().expect("call log poisoned").len()
    }

    pub fn count_for(&self, tool: &str) -> usize {
        self.0
            .lock()
            .expect("call log poisoned")
            .iter()
            .filter(|(name, _)| name == tool)
            .count()
    }

    pub fn args_for(&self, tool: &str) -> Vec<ToolArgs> {
        self.0
            .lock()
            .expect("call log poisoned")
            .iter()
            .filter(|(name, _)| name == tool)
            .map(|(_, args)| args.clone())
            .collect()
    }
}

enum Behavior {
    Reply(Value),
    /// Temperature by `city`; unknown cities fail.
    Weather(BTreeMap<String, f64>),
    Fail(String),
    Panic,
}

/// Scriptable tool for engine tests.
pub struct MockTool {
    name: &'static str,
    behavior: Behavior,
    delay: Duration,
    log: CallLog,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockTool {
    fn with_behavior(name: &'static str, behavior: Behavior, log: &CallLog) -> Self {
        Self {
            name,
            behavior,
            delay: Duration::ZERO,
            log: log.clone(),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reply(name: &'static str, value: Value, log: &CallLog) -> Self {
        Self::with_behavior(name, Behavior::Reply(value), log)
    }

    pub fn weather(cities: &[(&str, f64)], log: &CallLog) -> Self {
        let table = cities
            .iter()
            .map(|(city, temp)| ((*city).to_string(), *temp))
            .collect();
        Self::with_behavior("weather", Behavior::Weather(table), log)
    }

    pub fn failing(name: &'static str, message: &str, log: &CallLog) -> Self {
        Self::with_behavior(name, Behavior::Fail(message.to_string()), log)
    }

    pub fn panicking(name: &'static str, log: &CallLog) -> Self {
        Self::with_behavior(name, Behavior::Panic, log)
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Highest number of simultaneous invocations seen so far.
    pub fn peak_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak)
    }

    fn respond(&self, args: &ToolArgs) -> anyhow::Result<Value> {
        match &self.behavior {
            Behavior::Reply(value) => Ok(value.clone()),
            Behavior::Weather(table) => {
                let city = args
                    .get("city")
                    .and_then(Value::as_str)
                    .ok_or_else(|| anyhow::anyhow!("missing 'city' parameter"))?;
                let temp = table
                    .get(city)
                    .ok_or_else(|| anyhow::anyhow!("city '{city}' not found"))?;
                Ok(json!({
                    "city": city,
                    "temp": temp,
                    "summary": format!("{city}: {temp}°C"),
                }))
            }
            Behavior::Fail(message) => Err(anyhow::anyhow!(message.clone())),
            Behavior::Panic => panic!("{} exploded", self.name),
        }
    }
}

impl Tool for MockTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "scripted test tool"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }

    fn execute<'a>(&'a self, args: ToolArgs) -> ToolFuture<'a> {
        Box::pin(async move {
            self.log.record(self.name, &args);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let result = self.respond(&args);

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

/// Calculator wrapped so its invocations land in the call log.
pub struct LoggedCalculator {
    inner: CalculatorTool,
    log: CallLog,
}

impl LoggedCalculator {
    pub fn new(log: &CallLog) -> Self {
        Self {
            inner: CalculatorTool::new(),
            log: log.clone(),
        }
    }
}

impl Tool for LoggedCalculator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn parameters_schema(&self) -> Value {
        self.inner.parameters_schema()
    }

    fn execute<'a>(&'a self, args: ToolArgs) -> ToolFuture<'a> {
        self.log.record("calculator", &args);
        self.inner.execute(args)
    }
}

pub fn registry(tools: Vec<Box<dyn Tool>>) -> Arc<ToolRegistry> {
    Arc::new(tools.into_iter().collect())
}

pub fn engine(tools: Vec<Box<dyn Tool>>, config: &EngineConfig) -> PlanEngine {
    PlanEngine::new(registry(tools), config, Arc::new(NoopObserver))
}

pub fn engine_with_observer(
    tools: Vec<Box<dyn Tool>>,
    config: &EngineConfig,
    observer: Arc<dyn Observer>,
) -> PlanEngine {
    PlanEngine::new(registry(tools), config, observer)
}

/// Paris 14.8, London 11.2, Tokyo 18.0 plus the real calculator.
pub fn weather_and_calculator(log: &CallLog) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(MockTool::weather(
            &[("Paris", 14.8), ("London", 11.2), ("Tokyo", 18.0)],
            log,
        )) as Box<dyn Tool>,
        Box::new(LoggedCalculator::new(log)),
    ]
}

pub fn engine_config(max_parallel_steps: usize) -> EngineConfig {
    EngineConfig {
        max_parallel_steps,
        ..EngineConfig::default()
    }
}
