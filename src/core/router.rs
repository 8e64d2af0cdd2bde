//! 路由：每个节点执行后根据状态决定下一步
//!
//! 判定顺序（先匹配先生效）：
//! 1. 已有最终答案 → 结束
//! 2. 尚无计划 → 规划；规划次数用尽 → 结束
//! 3. 首个 pending 步骤 → 该步骤的 Agent（连同步骤下标）
//! 4. 没有 pending 步骤 → 协调者汇总

use std::fmt;

use serde::Serialize;

use crate::core::ResearchState;
use crate::plan::AgentId;

/// 协调者（规划 + 汇总）的节点名
pub const COORDINATOR: &str = "Lead_Researcher";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// 协调者生成计划
    Plan,
    /// 由 agent 执行 index 处的步骤
    Execute { agent: AgentId, index: usize },
    /// 协调者汇总最终答案
    Synthesize,
    End,
}

impl Route {
    /// 执行该路由的节点名；End 为 None
    pub fn node(&self) -> Option<&'static str> {
        match self {
            Route::Plan | Route::Synthesize => Some(COORDINATOR),
            Route::Execute { agent, .. } => Some(agent.as_str()),
            Route::End => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Plan => write!(f, "{} (plan)", COORDINATOR),
            Route::Execute { agent, index } => write!(f, "{} (step index {})", agent, index),
            Route::Synthesize => write!(f, "{} (synthesize)", COORDINATOR),
            Route::End => f.write_str("END"),
        }
    }
}

/// 纯函数：状态 → 下一路由
pub fn route(state: &ResearchState, max_planning_attempts: usize) -> Route {
    if state.final_answer.is_some() {
        return Route::End;
    }
    if state.plan.is_empty() {
        if state.planning_failed(max_planning_attempts) {
            return Route::End;
        }
        return Route::Plan;
    }
    match state.plan.first_pending() {
        Some((index, step)) => Route::Execute {
            agent: step.assigned_agent,
            index,
        },
        None => Route::Synthesize,
    }
}
