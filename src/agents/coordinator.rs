//! Lead_Researcher：规划与汇总
//!
//! 规划：把用户问题交给 LLM，要求输出 JSON 步骤列表；解析失败时返回 PlanRejected，
//! 由路由决定是否重试。LLM 调用本身失败则直接向上传播。
//! 汇总：所有步骤完成后，把各步骤结果拼成上下文，生成最终答案。

use std::sync::Arc;

use crate::core::{AgentError, ResearchState, StateUpdate};
use crate::llm::{complete_with_system, LlmClient};
use crate::plan::{parse_plan, plan_schema_json, AgentId, Plan};

pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a Lead Researcher. Synthesize the findings.";

pub struct LeadResearcher {
    llm: Arc<dyn LlmClient>,
}

impl LeadResearcher {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 规划 system prompt：团队成员说明 + 输出格式
    pub fn planning_prompt() -> String {
        let team = AgentId::ALL
            .iter()
            .map(|a| format!("- {}: {}", a, agent_role(*a)))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "You are the Lead Researcher in an advanced agentic lab.\n\
             Break the user's question about the research paper into a short sequence of steps \
             and assign each step to exactly one member of your team:\n{}\n\n\
             Return ONLY a JSON array of objects with `description` and `assigned_agent`, \
             matching this schema:\n{}",
            team,
            plan_schema_json()
        )
    }

    pub async fn plan(&self, state: &ResearchState) -> Result<StateUpdate, AgentError> {
        let prompt = format!("User Query: {}\n\nCreate a research plan.", state.user_query);
        let raw = complete_with_system(self.llm.as_ref(), &Self::planning_prompt(), &prompt)
            .await
            .map_err(AgentError::LlmError)?;

        match parse_plan(&raw) {
            Ok(drafts) => {
                let plan = Plan::from_drafts(drafts);
                tracing::info!(run = %state.run_id, steps = plan.len(), "plan created");
                Ok(StateUpdate::PlanCreated { plan })
            }
            Err(e) => {
                tracing::warn!(
                    run = %state.run_id,
                    attempt = state.planning_attempts + 1,
                    error = %e,
                    "planner output rejected"
                );
                Ok(StateUpdate::PlanRejected {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// 汇总；计划为空或仍有未完成步骤时返回 Unchanged
    pub async fn synthesize(&self, state: &ResearchState) -> Result<StateUpdate, AgentError> {
        if state.plan.is_empty() || !state.plan.all_completed() {
            return Ok(StateUpdate::Unchanged);
        }

        let context = state
            .plan
            .steps()
            .iter()
            .map(|s| {
                format!(
                    "Step {} ({}): {}",
                    s.id,
                    s.assigned_agent,
                    s.result.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = format!(
            "{}\n\nResearch Notes:\n{}\n\nWrite the final answer to the user's question.",
            state.user_query, context
        );

        let answer = complete_with_system(self.llm.as_ref(), SYNTHESIS_SYSTEM_PROMPT, &prompt)
            .await
            .map_err(AgentError::LlmError)?;
        tracing::info!(run = %state.run_id, answer_chars = answer.chars().count(), "synthesis done");
        Ok(StateUpdate::Synthesized {
            answer: answer.trim().to_string(),
        })
    }
}

fn agent_role(agent: AgentId) -> &'static str {
    match agent {
        AgentId::PdfAnalyst => "reads the uploaded paper and answers questions about its content",
        AgentId::CitationScout => "searches arXiv and Google Scholar for related work and citations",
        AgentId::VisualSpecialist => "draws Mermaid diagrams of methods, architectures and flows",
    }
}
