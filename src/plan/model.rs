//! 研究计划数据模型：AgentId / StepStatus / PlanStep / Plan
//!
//! Plan 创建后步骤列表固定：只按位置替换步骤，不追加、不删除；id 为 1..N 且与位置一一对应。

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 执行计划步骤的专家 Agent（封闭集合，序列化名与 LLM 约定一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum AgentId {
    /// 基于上传文档检索回答
    #[serde(rename = "PDF_Analyst")]
    PdfAnalyst,
    /// 外部论文检索与引用核查
    #[serde(rename = "Citation_Scout")]
    CitationScout,
    /// 生成 Mermaid 图
    #[serde(rename = "Visual_Specialist")]
    VisualSpecialist,
}

impl AgentId {
    pub const ALL: [AgentId; 3] = [
        AgentId::PdfAnalyst,
        AgentId::CitationScout,
        AgentId::VisualSpecialist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::PdfAnalyst => "PDF_Analyst",
            AgentId::CitationScout => "Citation_Scout",
            AgentId::VisualSpecialist => "Visual_Specialist",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 步骤状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
}

/// 计划中的单个步骤
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: u32,
    pub description: String,
    pub assigned_agent: AgentId,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl PlanStep {
    pub fn is_pending(&self) -> bool {
        self.status == StepStatus::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    /// 返回已完成的新步骤，原步骤保持不变
    fn completed_with(&self, result: String) -> Self {
        Self {
            id: self.id,
            description: self.description.clone(),
            assigned_agent: self.assigned_agent,
            status: StepStatus::Completed,
            result: Some(result),
        }
    }
}

/// LLM 规划输出中的单条记录（只含描述与负责 Agent）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StepDraft {
    /// 该步骤要完成的具体任务
    pub description: String,
    /// 负责该步骤的 Agent，取值 PDF_Analyst / Citation_Scout / Visual_Specialist
    pub assigned_agent: AgentId,
}

/// 有序步骤序列；序列化为步骤数组，反序列化经 `from_steps` 校验
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PlanStep>", into = "Vec<PlanStep>")]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    /// 由草稿构建计划：id 按顺序赋 1..N，状态全部 pending，无结果
    pub fn from_drafts(drafts: Vec<StepDraft>) -> Self {
        let steps = drafts
            .into_iter()
            .enumerate()
            .map(|(i, d)| PlanStep {
                id: (i + 1) as u32,
                description: d.description,
                assigned_agent: d.assigned_agent,
                status: StepStatus::Pending,
                result: None,
            })
            .collect();
        Self { steps }
    }

    /// 从已有步骤恢复计划，校验 id 连续且与位置一致、结果仅出现在已完成步骤上
    pub fn from_steps(steps: Vec<PlanStep>) -> Result<Self, String> {
        for (i, step) in steps.iter().enumerate() {
            let expected = (i + 1) as u32;
            if step.id != expected {
                return Err(format!(
                    "step at position {} has id {}, expected {}",
                    i, step.id, expected
                ));
            }
            if step.result.is_some() && !step.is_completed() {
                return Err(format!("step {} has a result but is not completed", step.id));
            }
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&PlanStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 最靠前的 pending 步骤及其下标
    pub fn first_pending(&self) -> Option<(usize, &PlanStep)> {
        self.steps.iter().enumerate().find(|(_, s)| s.is_pending())
    }

    pub fn all_completed(&self) -> bool {
        self.steps.iter().all(PlanStep::is_completed)
    }

    pub fn completed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_completed()).count()
    }

    /// 返回新计划：index 处步骤标记为 completed 并写入结果，其余步骤按值复制
    ///
    /// index 越界或该步骤已完成时返回 None（结果一旦写入不可覆盖）。
    pub fn with_completed(&self, index: usize, result: String) -> Option<Plan> {
        let target = self.steps.get(index)?;
        if target.is_completed() {
            return None;
        }
        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if i == index {
                    s.completed_with(result.clone())
                } else {
                    s.clone()
                }
            })
            .collect();
        Some(Plan { steps })
    }

    /// 文本形式的计划进度（供 CLI 展示）
    pub fn render_status(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            let mark = match step.status {
                StepStatus::Pending => "[ ]",
                StepStatus::InProgress => "[~]",
                StepStatus::Completed => "[x]",
            };
            out.push_str(&format!(
                "{} Step {}: {} - {}\n",
                mark, step.id, step.assigned_agent, step.description
            ));
            if let Some(result) = &step.result {
                for line in result.lines() {
                    out.push_str(&format!("      {}\n", line));
                }
            }
        }
        out
    }
}

impl TryFrom<Vec<PlanStep>> for Plan {
    type Error = String;

    fn try_from(steps: Vec<PlanStep>) -> Result<Self, Self::Error> {
        Plan::from_steps(steps)
    }
}

impl From<Plan> for Vec<PlanStep> {
    fn from(plan: Plan) -> Self {
        plan.steps
    }
}
