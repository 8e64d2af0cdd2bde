//! 研究会话状态与归约
//!
//! ResearchState 是一次编排运行的不可变快照；各节点只返回 StateUpdate，
//! 由 `ResearchState::apply` 生成新状态，旧状态保持不变。

use serde::Serialize;

use crate::core::AgentError;
use crate::memory::{Message, Transcript};
use crate::plan::Plan;

pub const PLAN_CREATED_MESSAGE: &str = "I have created a research plan.";

/// 一次用户提问对应的编排状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchState {
    /// 运行 ID，用于日志关联
    pub run_id: String,
    pub messages: Transcript,
    pub user_query: String,
    pub plan: Plan,
    /// 下一个待执行步骤的下标，始终等于首个 pending 步骤的下标
    pub current_step_index: usize,
    pub diagrams: Vec<String>,
    pub final_answer: Option<String>,
    /// 已进行的规划次数（含失败）
    pub planning_attempts: usize,
}

/// 节点产出的状态变化
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    /// 规划成功：新计划，游标归零
    PlanCreated { plan: Plan },
    /// 规划输出无法解析：记录诊断消息，计划保持为空
    PlanRejected { reason: String },
    /// index 处步骤完成；可视化步骤附带原始图表代码
    StepCompleted {
        index: usize,
        result: String,
        diagram: Option<String>,
    },
    Synthesized { answer: String },
    /// 节点未认领任何工作（例如 Agent 与步骤不匹配）
    Unchanged,
}

impl ResearchState {
    /// 新提问：计划与图表清空，沿用已有对话记录
    pub fn new(user_query: impl Into<String>, messages: Transcript) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            messages,
            user_query: user_query.into(),
            plan: Plan::default(),
            current_step_index: 0,
            diagrams: Vec::new(),
            final_answer: None,
            planning_attempts: 0,
        }
    }

    /// 以已有计划开始，游标对齐到首个 pending 步骤
    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.current_step_index = plan
            .first_pending()
            .map(|(i, _)| i)
            .unwrap_or_else(|| plan.len());
        self.plan = plan;
        self
    }

    /// 计划为空、没有最终答案且规划次数已用尽
    pub fn planning_failed(&self, max_planning_attempts: usize) -> bool {
        self.plan.is_empty()
            && self.final_answer.is_none()
            && self.planning_attempts >= max_planning_attempts.max(1)
    }

    /// 纯归约：由当前状态与一次更新得到新状态
    pub fn apply(&self, update: StateUpdate) -> Result<ResearchState, AgentError> {
        let mut next = self.clone();
        match update {
            StateUpdate::PlanCreated { plan } => {
                next.plan = plan;
                next.current_step_index = 0;
                next.planning_attempts += 1;
                next.messages.push(Message::assistant(PLAN_CREATED_MESSAGE));
            }
            StateUpdate::PlanRejected { reason } => {
                next.planning_attempts += 1;
                next.messages
                    .push(Message::assistant(format!("Error creating plan: {}", reason)));
            }
            StateUpdate::StepCompleted {
                index,
                result,
                diagram,
            } => {
                let len = self.plan.len();
                if index >= len {
                    return Err(AgentError::StepOutOfRange { index, len });
                }
                next.plan = self
                    .plan
                    .with_completed(index, result)
                    .ok_or(AgentError::StepAlreadyCompleted(index))?;
                next.current_step_index = index + 1;
                if let Some(diagram) = diagram {
                    next.diagrams.push(diagram);
                }
            }
            StateUpdate::Synthesized { answer } => {
                next.final_answer = Some(answer);
            }
            StateUpdate::Unchanged => {}
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{AgentId, StepDraft, StepStatus};

    fn two_step_plan() -> Plan {
        Plan::from_drafts(vec![
            StepDraft {
                description: "Read the abstract".into(),
                assigned_agent: AgentId::PdfAnalyst,
            },
            StepDraft {
                description: "Diagram the pipeline".into(),
                assigned_agent: AgentId::VisualSpecialist,
            },
        ])
    }

    #[test]
    fn test_new_state_is_fresh() {
        let transcript = Transcript::new().with(Message::user("earlier question"));
        let state = ResearchState::new("what is new here?", transcript.clone());
        assert!(state.plan.is_empty());
        assert!(state.diagrams.is_empty());
        assert_eq!(state.messages, transcript);
        assert_eq!(state.current_step_index, 0);
    }

    #[test]
    fn test_plan_created_resets_cursor_and_acknowledges() {
        let state = ResearchState::new("q", Transcript::new());
        let next = state
            .apply(StateUpdate::PlanCreated {
                plan: two_step_plan(),
            })
            .unwrap();
        assert_eq!(next.plan.len(), 2);
        assert_eq!(next.current_step_index, 0);
        assert_eq!(next.planning_attempts, 1);
        assert_eq!(
            next.messages.last_assistant().unwrap().content,
            PLAN_CREATED_MESSAGE
        );
        // 原状态不变
        assert!(state.plan.is_empty());
    }

    #[test]
    fn test_plan_rejected_keeps_plan_empty() {
        let state = ResearchState::new("q", Transcript::new());
        let next = state
            .apply(StateUpdate::PlanRejected {
                reason: "expected value".into(),
            })
            .unwrap();
        assert!(next.plan.is_empty());
        assert_eq!(next.planning_attempts, 1);
        assert!(next
            .messages
            .last_assistant()
            .unwrap()
            .content
            .starts_with("Error creating plan:"));
        assert!(!next.planning_failed(3));
        assert!(next.planning_failed(1));
    }

    #[test]
    fn test_step_completed_advances_cursor_and_collects_diagram() {
        let state = ResearchState::new("q", Transcript::new()).with_plan(two_step_plan());
        let state = state
            .apply(StateUpdate::StepCompleted {
                index: 0,
                result: "abstract says X".into(),
                diagram: None,
            })
            .unwrap();
        assert_eq!(state.current_step_index, 1);
        let state = state
            .apply(StateUpdate::StepCompleted {
                index: 1,
                result: "Generated Diagram".into(),
                diagram: Some("graph TD; A-->B".into()),
            })
            .unwrap();
        assert_eq!(state.current_step_index, 2);
        assert_eq!(state.diagrams, vec!["graph TD; A-->B".to_string()]);
        assert!(state.plan.steps().iter().all(|s| s.status == StepStatus::Completed));
    }

    #[test]
    fn test_step_completed_rejects_invalid_index() {
        let state = ResearchState::new("q", Transcript::new()).with_plan(two_step_plan());
        let err = state
            .apply(StateUpdate::StepCompleted {
                index: 9,
                result: "x".into(),
                diagram: None,
            })
            .unwrap_err();
        assert!(matches!(err, AgentError::StepOutOfRange { index: 9, len: 2 }));

        let done = state
            .apply(StateUpdate::StepCompleted {
                index: 0,
                result: "x".into(),
                diagram: None,
            })
            .unwrap();
        assert!(matches!(
            done.apply(StateUpdate::StepCompleted {
                index: 0,
                result: "y".into(),
                diagram: None,
            }),
            Err(AgentError::StepAlreadyCompleted(0))
        ));
    }

    #[test]
    fn test_with_plan_aligns_cursor() {
        let plan = two_step_plan().with_completed(0, "done".into()).unwrap();
        let state = ResearchState::new("q", Transcript::new()).with_plan(plan);
        assert_eq!(state.current_step_index, 1);
    }
}
