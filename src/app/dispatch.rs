use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use toolweave::Config;
use toolweave::agent::{Agent, BundleFuser, ChatClient, ModelFuser, ModelPlanner, StaticPlanner};
use toolweave::engine::{PlanEngine, ResultBundle};
use toolweave::observability::{MetricsObserver, MultiObserver, Observer, create_observer};
use toolweave::planner::PlanParser;
use toolweave::tools::{default_tools, tool_descriptions};

/// Engine wired from config. With `verbose`, a metrics observer rides along
/// so the run can be summarized afterwards.
fn build_engine(config: &Config, verbose: bool) -> Result<(PlanEngine, Option<Arc<MetricsObserver>>)> {
    let registry = Arc::new(default_tools(&config.tools)?);
    let configured = create_observer(&config.observability);

    let mut metrics = None;
    let observer: Arc<dyn Observer> = if verbose {
        let recorder = Arc::new(MetricsObserver::new());
        metrics = Some(Arc::clone(&recorder));
        Arc::new(MultiObserver::new(vec![configured, recorder as Arc<dyn Observer>]))
    } else {
        configured
    };

    Ok((PlanEngine::new(registry, &config.engine, observer), metrics))
}

fn read_plan(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file {}", path.display()))
}

fn print_metrics(metrics: Option<&MetricsObserver>) {
    if let Some(metrics) = metrics {
        metrics.flush();
        eprintln!();
        eprint!("{}", metrics.render());
        let snapshot = metrics.snapshot();
        eprintln!(
            "# execution sequence: {}",
            snapshot.execution_sequence.join(" -> ")
        );
    }
}

async fn run_plan(config: &Config, plan: &Path, query: &str, json: bool, verbose: bool) -> Result<()> {
    let (engine, metrics) = build_engine(config, verbose)?;

    if json {
        // The raw bundle is printed even when every step failed.
        let steps = PlanParser::parse_response(&read_plan(plan)?)?;
        let bundle = engine.run(steps).await?;
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        let planner = StaticPlanner::from_file(plan)?;
        let agent = Agent::new(Arc::new(planner), engine, Arc::new(BundleFuser::new()));
        let answer = agent.answer(query).await;
        print_metrics(metrics.as_deref());
        print!("{}", answer?.text);
        return Ok(());
    }

    print_metrics(metrics.as_deref());
    Ok(())
}

#[derive(Serialize)]
struct AskOutput<'a> {
    answer: &'a str,
    bundle: &'a ResultBundle,
}

async fn ask(config: &Config, question: &str, json: bool, verbose: bool) -> Result<()> {
    let (engine, metrics) = build_engine(config, verbose)?;
    let client = Arc::new(ChatClient::new(&config.model));
    let planner = ModelPlanner::new(Arc::clone(&client), &tool_descriptions(engine.registry()));
    let agent = Agent::new(Arc::new(planner), engine, Arc::new(ModelFuser::new(client)));

    let answer = agent.answer(question).await;
    print_metrics(metrics.as_deref());
    let answer = answer?;

    if json {
        let output = AskOutput {
            answer: &answer.text,
            bundle: &answer.bundle,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", answer.text);
    }
    Ok(())
}

fn validate_plan(config: &Config, plan: &Path) -> Result<()> {
    let (engine, _) = build_engine(config, false)?;
    let steps = PlanParser::parse_response(&read_plan(plan)?)?;
    let graph = engine.validate(steps)?;
    let waves = engine.schedule(&graph);

    println!(
        "Plan OK: {} steps, {} dependencies, {} waves",
        graph.len(),
        graph.edge_count(),
        waves.len()
    );
    for wave in &waves {
        println!("  wave {}: {}", wave.index, wave.steps.join(", "));
    }
    Ok(())
}

fn list_tools(config: &Config) -> Result<()> {
    let registry = default_tools(&config.tools)?;
    if registry.is_empty() {
        println!("No tools enabled.");
        return Ok(());
    }
    for (name, description) in tool_descriptions(&registry) {
        println!("  {name:<20} {description}");
    }
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Ask { question, json } => ask(&config, &question, json, cli.verbose).await,
        Commands::Run { plan, query, json } => {
            run_plan(&config, &plan, &query, json, cli.verbose).await
        }
        Commands::Validate { plan } => validate_plan(&config, &plan),
        Commands::Tools => list_tools(&config),
    }
}
