pub mod executor;
pub mod resolve;
pub mod results;
pub mod runner;

pub use executor::StepExecutor;
pub use resolve::{PriorResults, resolve_args};
pub use results::{
    BundleSummary, ResultAggregator, ResultBundle, StepError, StepErrorKind, StepResult,
    StepStatus,
};
pub use runner::PlanEngine;
