pub mod chat;
pub mod fuser;
pub mod model_fuser;
pub mod model_planner;
pub mod orchestrator;
pub mod static_planner;
pub mod traits;

pub use chat::ChatClient;
pub use fuser::BundleFuser;
pub use model_fuser::ModelFuser;
pub use model_planner::ModelPlanner;
pub use orchestrator::{Agent, Answer};
pub use static_planner::StaticPlanner;
pub use traits::{Fuser, Planner};
