//! Visual_Specialist：生成 Mermaid 图表

use std::sync::Arc;

use async_trait::async_trait;

use crate::agents::{Agent, StepOutput};
use crate::core::AgentError;
use crate::llm::{complete_with_system, LlmClient};
use crate::plan::{extract_diagram, AgentId, PlanStep};

pub const VISUAL_SYSTEM_PROMPT: &str =
    "You are a Visual Specialist. Create valid Mermaid diagrams.";

pub struct VisualSpecialist {
    llm: Arc<dyn LlmClient>,
}

impl VisualSpecialist {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

/// 步骤结果中附带的图表文本
pub fn diagram_result(diagram: &str) -> String {
    format!("Generated Diagram:\n```mermaid\n{}\n```", diagram)
}

#[async_trait]
impl Agent for VisualSpecialist {
    fn id(&self) -> AgentId {
        AgentId::VisualSpecialist
    }

    async fn work(&self, step: &PlanStep) -> Result<StepOutput, AgentError> {
        let prompt = format!(
            "Task: {}\n\nGenerate a Mermaid.js diagram code for this task. \
             Return ONLY the mermaid code, wrapped in ```mermaid ... ```.",
            step.description
        );
        let raw = complete_with_system(self.llm.as_ref(), VISUAL_SYSTEM_PROMPT, &prompt)
            .await
            .map_err(AgentError::LlmError)?;

        let diagram = extract_diagram(&raw);
        Ok(StepOutput {
            result: diagram_result(&diagram),
            diagram: Some(diagram),
        })
    }
}
