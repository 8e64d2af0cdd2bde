//! 编排过程事件：用于流式展示路由决策与每个节点完成后的状态

use serde::Serialize;

use crate::core::{ResearchState, Route};

/// 单步过程事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    /// 路由结果
    Routed { route: Route },
    /// 节点执行完毕后的完整状态快照
    NodeCompleted { node: String, state: ResearchState },
    /// 运行结束
    Finished { final_answer: Option<String> },
}
