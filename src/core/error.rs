//! 编排错误类型
//!
//! 计划解析失败在规划节点内部被吸收为对话消息；其余错误向上传播并终止本次运行。

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Plan parse error: {0}")]
    PlanParse(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// 路由选中的步骤与游标不一致
    #[error("Cursor at {cursor} but router selected step index {selected}")]
    CursorMismatch { cursor: usize, selected: usize },

    #[error("Step index {index} out of range for plan of {len} steps")]
    StepOutOfRange { index: usize, len: usize },

    #[error("Step index {0} is already completed")]
    StepAlreadyCompleted(usize),

    /// 节点未产生任何状态变化，路由与状态已不一致
    #[error("{node} made no progress on step {step:?}")]
    Stalled { node: String, step: Option<usize> },

    #[error("Orchestration exceeded {0} iterations")]
    IterationLimit(usize),

    #[error("Index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
