//! 编排集成测试：脚本化 LLM + 桩检索，覆盖完整运行、终止、失败与会话行为

use std::sync::Arc;

use async_trait::async_trait;
use quill::agents::{
    Agent, AgentRoster, CitationScout, LeadResearcher, PdfAnalyst, StepOutput, VisualSpecialist,
};
use quill::config::AppConfig;
use quill::core::{
    AgentError, Orchestrator, OrchestratorEvent, ResearchSession, ResearchState, Route,
    PLAN_CREATED_MESSAGE,
};
use quill::llm::{LlmClient, MockLlmClient, ScriptedLlmClient};
use quill::memory::{Role, Transcript};
use quill::plan::{AgentId, Plan, PlanStep, StepDraft, StepStatus};
use quill::rag::{Passage, PassageMetadata, RetrievalIndex};
use quill::tools::{Paper, PaperSearch};
use tokio::sync::mpsc;

const THREE_STEP_PLAN: &str = r#"```json
[
  {"description": "Summarize the method", "assigned_agent": "PDF_Analyst"},
  {"description": "Find papers that cited it", "assigned_agent": "Citation_Scout"},
  {"description": "Draw the architecture", "assigned_agent": "Visual_Specialist"}
]
```"#;

struct FakeIndex;

#[async_trait]
impl RetrievalIndex for FakeIndex {
    async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<Passage>, String> {
        Ok(vec![Passage {
            content: "We propose a sparse attention layer.".into(),
            metadata: PassageMetadata {
                source: "paper.txt".into(),
                page: 2,
                section: "Method".into(),
            },
            score: 1.0,
        }])
    }
}

struct NoPapers;

#[async_trait]
impl PaperSearch for NoPapers {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<Paper>, String> {
        Ok(Vec::new())
    }
}

/// 身份与所在槽位不符的 Agent，用于触发不匹配保护
struct Impostor;

#[async_trait]
impl Agent for Impostor {
    fn id(&self) -> AgentId {
        AgentId::CitationScout
    }

    async fn work(&self, _step: &PlanStep) -> Result<StepOutput, AgentError> {
        Ok(StepOutput::text("should never run"))
    }
}

fn roster(llm: Arc<dyn LlmClient>) -> AgentRoster {
    AgentRoster::new(
        Arc::new(PdfAnalyst::new(llm.clone(), Arc::new(FakeIndex), 3)),
        Arc::new(CitationScout::new(llm.clone(), Arc::new(NoPapers), 3)),
        Arc::new(VisualSpecialist::new(llm)),
    )
}

fn orchestrator(llm: Arc<dyn LlmClient>) -> Orchestrator {
    Orchestrator::new(LeadResearcher::new(llm.clone()), roster(llm))
}

fn pending_plan() -> Plan {
    Plan::from_drafts(vec![
        StepDraft {
            description: "Summarize the method".into(),
            assigned_agent: AgentId::PdfAnalyst,
        },
        StepDraft {
            description: "Find related work".into(),
            assigned_agent: AgentId::CitationScout,
        },
        StepDraft {
            description: "Draw the architecture".into(),
            assigned_agent: AgentId::VisualSpecialist,
        },
    ])
}

#[tokio::test]
async fn test_full_run_plans_executes_and_synthesizes() {
    let llm = Arc::new(ScriptedLlmClient::new([
        THREE_STEP_PLAN,
        "A sparse attention layer.",
        "Cited by 12 follow-up papers.",
        "```mermaid\ngraph TD; Input-->Sparse-->Output\n```",
        "The paper proposes sparse attention.",
    ]));
    let state = ResearchState::new("What does this paper propose?", Transcript::new());

    let done = orchestrator(llm.clone()).run(state).await.unwrap();

    assert_eq!(done.final_answer.as_deref(), Some("The paper proposes sparse attention."));
    assert_eq!(done.plan.len(), 3);
    let ids: Vec<u32> = done.plan.steps().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(done.plan.steps().iter().all(|s| s.status == StepStatus::Completed));
    assert_eq!(done.current_step_index, 3);
    assert_eq!(done.diagrams, vec!["graph TD; Input-->Sparse-->Output".to_string()]);
    assert!(done.plan.get(2).unwrap().result.as_deref().unwrap().starts_with("Generated Diagram:"));
    assert_eq!(
        done.messages.last_assistant().unwrap().content,
        PLAN_CREATED_MESSAGE
    );
    assert_eq!(llm.call_count(), 5);

    // 汇总提示按顺序包含每一步的结果
    let synthesis = &llm.requests()[4][1].content;
    let first = synthesis.find("Step 1 (PDF_Analyst)").unwrap();
    let second = synthesis.find("Step 2 (Citation_Scout)").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn test_terminates_after_n_agent_calls_plus_one_synthesis() {
    let llm = Arc::new(ScriptedLlmClient::new(["a", "b", "graph LR; A-->B", "final"]));
    let state = ResearchState::new("q", Transcript::new()).with_plan(pending_plan());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let done = orchestrator(llm.clone())
        .run_with_events(state, Some(&tx))
        .await
        .unwrap();
    drop(tx);

    assert_eq!(done.final_answer.as_deref(), Some("final"));
    assert_eq!(llm.call_count(), 4);

    let mut nodes = Vec::new();
    let mut routes = Vec::new();
    let mut finished = None;
    while let Some(event) = rx.recv().await {
        match event {
            OrchestratorEvent::Routed { route } => routes.push(route),
            OrchestratorEvent::NodeCompleted { node, state } => nodes.push((node, state)),
            OrchestratorEvent::Finished { final_answer } => finished = Some(final_answer),
        }
    }
    let names: Vec<&str> = nodes.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec!["PDF_Analyst", "Citation_Scout", "Visual_Specialist", "Lead_Researcher"]
    );
    assert_eq!(routes.first(), Some(&Route::Execute { agent: AgentId::PdfAnalyst, index: 0 }));
    assert_eq!(routes.last(), Some(&Route::End));
    assert_eq!(finished, Some(Some("final".to_string())));

    // 每个节点恰好推进一步，且未触及的步骤值相等但不共享存储
    for pair in nodes.windows(2).take(2) {
        let (before, after) = (&pair[0].1, &pair[1].1);
        assert_eq!(after.current_step_index, before.current_step_index + 1);
        assert_ne!(before.plan.steps().as_ptr(), after.plan.steps().as_ptr());
        let untouched = after.current_step_index..after.plan.len();
        for i in untouched {
            assert_eq!(before.plan.get(i), after.plan.get(i));
        }
    }
}

#[tokio::test]
async fn test_planning_retries_are_bounded() {
    let llm = Arc::new(ScriptedLlmClient::new([
        "Let me think about it.",
        "[]",
        "{\"steps\": 3}",
    ]));
    let state = ResearchState::new("q", Transcript::new());

    let done = orchestrator(llm.clone()).run(state).await.unwrap();

    assert!(done.plan.is_empty());
    assert!(done.final_answer.is_none());
    assert_eq!(done.planning_attempts, 3);
    assert_eq!(llm.call_count(), 3);
    let errors = done
        .messages
        .messages()
        .iter()
        .filter(|m| m.content.starts_with("Error creating plan:"))
        .count();
    assert_eq!(errors, 3);
    assert_eq!(
        done.messages.last_assistant().unwrap().content,
        "Unable to create a research plan after 3 attempts."
    );
}

#[tokio::test]
async fn test_planning_recovers_on_retry() {
    let llm = Arc::new(ScriptedLlmClient::new([
        "not json",
        r#"[{"description": "Summarize the method", "assigned_agent": "PDF_Analyst"}]"#,
        "sparse attention",
        "Sparse attention, explained.",
    ]));
    let done = orchestrator(llm.clone())
        .run(ResearchState::new("q", Transcript::new()))
        .await
        .unwrap();
    assert_eq!(done.planning_attempts, 2);
    assert_eq!(done.final_answer.as_deref(), Some("Sparse attention, explained."));
}

#[tokio::test]
async fn test_agent_llm_failure_is_fatal() {
    let llm = Arc::new(ScriptedLlmClient::new([THREE_STEP_PLAN]));
    llm.push_error("rate limited");
    let err = orchestrator(llm.clone())
        .run(ResearchState::new("q", Transcript::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::LlmError(ref e) if e == "rate limited"));
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_cursor_out_of_sync_is_rejected() {
    let plan = pending_plan().with_completed(0, "done".into()).unwrap();
    let mut state = ResearchState::new("q", Transcript::new()).with_plan(plan);
    state.current_step_index = 0;

    let llm = Arc::new(ScriptedLlmClient::new(Vec::<String>::new()));
    let err = orchestrator(llm.clone()).run(state).await.unwrap_err();
    assert!(matches!(
        err,
        AgentError::CursorMismatch {
            cursor: 0,
            selected: 1
        }
    ));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_misrouted_agent_stalls_instead_of_looping() {
    let llm: Arc<dyn LlmClient> = Arc::new(ScriptedLlmClient::new(Vec::<String>::new()));
    let roster = AgentRoster::new(
        Arc::new(Impostor),
        Arc::new(CitationScout::new(llm.clone(), Arc::new(NoPapers), 3)),
        Arc::new(VisualSpecialist::new(llm.clone())),
    );
    let orchestrator = Orchestrator::new(LeadResearcher::new(llm), roster);
    let state = ResearchState::new("q", Transcript::new()).with_plan(pending_plan());

    let err = orchestrator.run(state).await.unwrap_err();
    assert!(matches!(
        err,
        AgentError::Stalled { ref node, step: Some(0) } if node == "PDF_Analyst"
    ));
}

#[tokio::test]
async fn test_iteration_limit() {
    let mut cfg = AppConfig::default();
    cfg.app.max_iterations = 2;
    let llm = Arc::new(ScriptedLlmClient::new(["a", "b", "c", "d"]));
    let state = ResearchState::new("q", Transcript::new()).with_plan(pending_plan());

    let err = orchestrator(llm).with_limits(&cfg).run(state).await.unwrap_err();
    assert!(matches!(err, AgentError::IterationLimit(2)));
}

#[tokio::test]
async fn test_session_keeps_transcript_and_resets_plan() {
    let mut session = ResearchSession::new(orchestrator(Arc::new(MockLlmClient)));

    let first = session.submit("What is the main idea?").await.unwrap();
    assert_eq!(
        first.final_answer.as_deref(),
        Some("Mock synthesis for What is the main idea?")
    );
    assert_eq!(session.plan().len(), 3);
    assert_eq!(session.diagrams().len(), 1);

    session.submit("How was it evaluated?").await.unwrap();
    assert_eq!(session.plan().len(), 3);
    assert_eq!(session.diagrams().len(), 1);

    let transcript = session.transcript().messages();
    let users: Vec<&str> = transcript
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(users, vec!["What is the main idea?", "How was it evaluated?"]);
    assert_eq!(
        session.transcript().last_assistant().unwrap().content,
        "Mock synthesis for How was it evaluated?"
    );
}

#[tokio::test]
async fn test_failed_turn_leaves_session_untouched() {
    let llm = Arc::new(ScriptedLlmClient::new(Vec::<String>::new()));
    let mut session = ResearchSession::new(orchestrator(llm));
    assert!(session.submit("q").await.is_err());
    assert!(session.transcript().is_empty());
}
