//! 专家 Agent 与协调者
//!
//! 每个专家 Agent 只处理路由明确指定下标、且分配给自己的 pending 步骤；
//! 否则不做任何改变。完成后的状态变化统一以 StateUpdate::StepCompleted 返回。

pub mod analyst;
pub mod coordinator;
pub mod scout;
pub mod visualizer;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{AgentError, ResearchState, StateUpdate};
use crate::plan::{AgentId, PlanStep};

pub use analyst::PdfAnalyst;
pub use coordinator::LeadResearcher;
pub use scout::CitationScout;
pub use visualizer::VisualSpecialist;

/// Agent 对单个步骤的产出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    pub result: String,
    /// 仅可视化 Agent 产出
    pub diagram: Option<String>,
}

impl StepOutput {
    pub fn text(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            diagram: None,
        }
    }
}

/// 专家 Agent：执行一个已认领的步骤
#[async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> AgentId;

    async fn work(&self, step: &PlanStep) -> Result<StepOutput, AgentError>;
}

/// 按 Agent 契约执行 index 处的步骤
///
/// 越界、分配给其他 Agent、或已不是 pending 时返回 Unchanged。
pub async fn execute_step(
    agent: &dyn Agent,
    state: &ResearchState,
    index: usize,
) -> Result<StateUpdate, AgentError> {
    let Some(step) = state.plan.get(index) else {
        return Ok(StateUpdate::Unchanged);
    };
    if step.assigned_agent != agent.id() || !step.is_pending() {
        tracing::warn!(
            agent = %agent.id(),
            step = step.id,
            assigned = %step.assigned_agent,
            "agent invoked on a step it does not own, ignoring"
        );
        return Ok(StateUpdate::Unchanged);
    }

    tracing::info!(run = %state.run_id, agent = %agent.id(), step = step.id, "step started");
    let output = agent.work(step).await?;
    tracing::info!(
        run = %state.run_id,
        agent = %agent.id(),
        step = step.id,
        result_chars = output.result.chars().count(),
        "step completed"
    );

    Ok(StateUpdate::StepCompleted {
        index,
        result: output.result,
        diagram: output.diagram,
    })
}

/// 三个专家 Agent，按 AgentId 穷尽分派
#[derive(Clone)]
pub struct AgentRoster {
    analyst: Arc<dyn Agent>,
    scout: Arc<dyn Agent>,
    visualizer: Arc<dyn Agent>,
}

impl AgentRoster {
    pub fn new(
        analyst: Arc<dyn Agent>,
        scout: Arc<dyn Agent>,
        visualizer: Arc<dyn Agent>,
    ) -> Self {
        Self {
            analyst,
            scout,
            visualizer,
        }
    }

    pub fn get(&self, id: AgentId) -> &dyn Agent {
        match id {
            AgentId::PdfAnalyst => self.analyst.as_ref(),
            AgentId::CitationScout => self.scout.as_ref(),
            AgentId::VisualSpecialist => self.visualizer.as_ref(),
        }
    }
}
