//! 核心编排层：错误、状态与归约、路由、主控循环、多轮会话

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod router;
pub mod session;
pub mod state;

pub use error::AgentError;
pub use events::OrchestratorEvent;
pub use orchestrator::Orchestrator;
pub use router::{route, Route, COORDINATOR};
pub use session::ResearchSession;
pub use state::{ResearchState, StateUpdate, PLAN_CREATED_MESSAGE};
