mod graph;
mod parser;
mod scheduler;
mod types;

pub use graph::{PlanGraph, ToolCatalog};
pub use parser::PlanParser;
pub use scheduler::{DependencyScheduler, Wave};
pub use types::{ArgValue, FieldPath, Placeholder, PlaceholderSyntaxError, TemplatePart, ToolStep};
