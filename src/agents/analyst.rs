//! PDF_Analyst：基于上传文档的检索问答

use std::sync::Arc;

use async_trait::async_trait;

use crate::agents::{Agent, StepOutput};
use crate::core::AgentError;
use crate::llm::{complete_with_system, LlmClient};
use crate::plan::{AgentId, PlanStep};
use crate::rag::{Passage, RetrievalIndex};

pub const ANALYST_SYSTEM_PROMPT: &str = "You are a PDF Analyst. Be precise.";

pub struct PdfAnalyst {
    llm: Arc<dyn LlmClient>,
    index: Arc<dyn RetrievalIndex>,
    top_k: usize,
}

impl PdfAnalyst {
    pub fn new(llm: Arc<dyn LlmClient>, index: Arc<dyn RetrievalIndex>, top_k: usize) -> Self {
        Self { llm, index, top_k }
    }
}

fn format_context(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return "(no matching passages were found in the uploaded document)".to_string();
    }
    passages
        .iter()
        .map(|p| {
            format!(
                "Content: {}\nMetadata: source={}, page={}, section={}",
                p.content, p.metadata.source, p.metadata.page, p.metadata.section
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(task: &str, passages: &[Passage]) -> String {
    format!(
        "Task: {}\n\nContext from PDF:\n{}\n\nProvide the answer to the task based *strictly* on the context.",
        task,
        format_context(passages)
    )
}

#[async_trait]
impl Agent for PdfAnalyst {
    fn id(&self) -> AgentId {
        AgentId::PdfAnalyst
    }

    async fn work(&self, step: &PlanStep) -> Result<StepOutput, AgentError> {
        let passages = self
            .index
            .retrieve(&step.description, self.top_k)
            .await
            .map_err(AgentError::Retrieval)?;
        tracing::debug!(step = step.id, passages = passages.len(), "retrieved context");

        let prompt = build_prompt(&step.description, &passages);
        let answer = complete_with_system(self.llm.as_ref(), ANALYST_SYSTEM_PROMPT, &prompt)
            .await
            .map_err(AgentError::LlmError)?;
        Ok(StepOutput::text(answer.trim()))
    }
}
