pub mod calculator;
pub mod currency;
pub mod factory;
pub mod knowledge_base;
pub mod registry;
pub mod traits;
pub mod weather;

pub use calculator::{CalculatorError, CalculatorTool};
pub use currency::{CurrencyConverterTool, CurrencyError};
pub use factory::{default_tools, tool_descriptions};
pub use knowledge_base::{KnowledgeBaseError, KnowledgeBaseTool, KnowledgeEntry};
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolArgs, ToolFuture, ToolSpec};
pub use weather::{WeatherError, WeatherTool};
