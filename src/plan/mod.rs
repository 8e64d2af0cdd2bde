//! 计划层：研究计划数据模型与 LLM 输出解析

pub mod model;
pub mod parser;

pub use model::{AgentId, Plan, PlanStep, StepDraft, StepStatus};
pub use parser::{
    extract_diagram, extract_fenced_block, extract_labeled_block, parse_plan, plan_schema_json,
    strip_code_fence,
};
