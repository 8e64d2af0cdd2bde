//! 多轮研究会话：对话记录跨轮保留，计划与图表每轮重置

use crate::core::{AgentError, Orchestrator, ResearchState};
use crate::memory::{Message, Transcript};
use crate::plan::Plan;

pub struct ResearchSession {
    orchestrator: Orchestrator,
    transcript: Transcript,
    last_plan: Plan,
    last_diagrams: Vec<String>,
}

impl ResearchSession {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            transcript: Transcript::new(),
            last_plan: Plan::default(),
            last_diagrams: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// 最近一轮的计划
    pub fn plan(&self) -> &Plan {
        &self.last_plan
    }

    /// 最近一轮生成的图表
    pub fn diagrams(&self) -> &[String] {
        &self.last_diagrams
    }

    /// 提交一个问题，运行到结束并返回最终状态
    ///
    /// 出错时本轮的对话记录不写入会话。
    pub async fn submit(&mut self, query: &str) -> Result<ResearchState, AgentError> {
        let transcript = self.transcript.with(Message::user(query));
        let mut state = self
            .orchestrator
            .run(ResearchState::new(query, transcript))
            .await?;

        if let Some(answer) = &state.final_answer {
            state.messages.push(Message::assistant(answer.clone()));
        }
        self.transcript = state.messages.clone();
        self.last_plan = state.plan.clone();
        self.last_diagrams = state.diagrams.clone();
        Ok(state)
    }
}
