#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod observability;
pub mod planner;
pub mod tools;

pub use agent::{
    Agent, Answer, BundleFuser, ChatClient, Fuser, ModelFuser, ModelPlanner, Planner, StaticPlanner,
};
pub use config::Config;
pub use engine::{PlanEngine, ResultBundle, StepResult, StepStatus};
pub use error::{AgentError, PlanError, WeaveError};
pub use planner::{PlanGraph, PlanParser, ToolStep};
pub use tools::{Tool, ToolRegistry};
