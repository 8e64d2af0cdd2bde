//! Citation_Scout：外部论文检索与被引检索

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agents::{Agent, StepOutput};
use crate::core::AgentError;
use crate::llm::{complete_with_system, LlmClient};
use crate::plan::{AgentId, PlanStep};
use crate::tools::{CitationSearch, PaperSearch};

pub const SCOUT_SYSTEM_PROMPT: &str = "You are a Citation Scout.";

/// 描述中出现这些词时额外做被引检索
const CITATION_KEYWORDS: [&str; 3] = ["citation", "impact", "cited"];

pub struct CitationScout {
    llm: Arc<dyn LlmClient>,
    papers: Arc<dyn PaperSearch>,
    citations: Option<Arc<dyn CitationSearch>>,
    max_results: usize,
}

impl CitationScout {
    pub fn new(llm: Arc<dyn LlmClient>, papers: Arc<dyn PaperSearch>, max_results: usize) -> Self {
        Self {
            llm,
            papers,
            citations: None,
            max_results,
        }
    }

    pub fn with_citations(mut self, citations: Arc<dyn CitationSearch>) -> Self {
        self.citations = Some(citations);
        self
    }
}

fn wants_citations(description: &str) -> bool {
    let lower = description.to_lowercase();
    CITATION_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[async_trait]
impl Agent for CitationScout {
    fn id(&self) -> AgentId {
        AgentId::CitationScout
    }

    async fn work(&self, step: &PlanStep) -> Result<StepOutput, AgentError> {
        let papers = match self.papers.search(&step.description, self.max_results).await {
            Ok(papers) => serde_json::to_value(&papers)?,
            Err(e) => {
                tracing::warn!(step = step.id, error = %e, "paper search failed");
                json!({ "error": e })
            }
        };

        let mut prompt = format!(
            "Task: {}\n\nSearch Results (arXiv):\n{}",
            step.description,
            serde_json::to_string_pretty(&papers)?
        );

        if wants_citations(&step.description) {
            let citations: Value = match &self.citations {
                Some(search) => search.search(&step.description).await,
                None => json!({ "error": "citation search not configured" }),
            };
            prompt.push_str(&format!(
                "\n\nCitation Results (Scholar):\n{}",
                serde_json::to_string_pretty(&citations)?
            ));
        }
        prompt.push_str("\n\nSummarize the findings.");

        let answer = complete_with_system(self.llm.as_ref(), SCOUT_SYSTEM_PROMPT, &prompt)
            .await
            .map_err(AgentError::LlmError)?;
        Ok(StepOutput::text(answer.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;
    use crate::plan::{Plan, StepDraft};
    use crate::tools::Paper;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakePapers(Result<Vec<Paper>, String>);

    #[async_trait]
    impl PaperSearch for FakePapers {
        async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<Paper>, String> {
            self.0
                .clone()
                .map(|p| p.into_iter().take(max_results).collect())
        }
    }

    #[derive(Default)]
    struct CountingCitations(AtomicUsize);

    #[async_trait]
    impl CitationSearch for CountingCitations {
        async fn search(&self, _query: &str) -> Value {
            self.0.fetch_add(1, Ordering::SeqCst);
            json!({ "organic": [{ "title": "Attention Is All You Need", "citedBy": 100000 }] })
        }
    }

    fn step(description: &str) -> PlanStep {
        Plan::from_drafts(vec![StepDraft {
            description: description.into(),
            assigned_agent: AgentId::CitationScout,
        }])
        .steps()[0]
            .clone()
    }

    fn paper() -> Paper {
        Paper {
            title: "Vision Transformers".into(),
            summary: "Images as patches".into(),
            authors: vec!["A. Dosovitskiy".into()],
            url: "http://arxiv.org/pdf/2010.11929".into(),
            published_date: "2020-10-22".into(),
        }
    }

    #[tokio::test]
    async fn test_search_results_reach_prompt() {
        let llm = Arc::new(ScriptedLlmClient::new(["Related: ViT."]));
        let citations = Arc::new(CountingCitations::default());
        let scout = CitationScout::new(llm.clone(), Arc::new(FakePapers(Ok(vec![paper()]))), 5)
            .with_citations(citations.clone());

        let out = scout.work(&step("Find related work on transformers")).await.unwrap();
        assert_eq!(out.result, "Related: ViT.");
        assert_eq!(citations.0.load(Ordering::SeqCst), 0);

        let prompt = &llm.requests()[0][1].content;
        assert!(prompt.contains("Vision Transformers"));
        assert!(prompt.ends_with("Summarize the findings."));
    }

    #[tokio::test]
    async fn test_citation_keywords_trigger_scholar() {
        let llm = Arc::new(ScriptedLlmClient::new(["Highly cited."]));
        let citations = Arc::new(CountingCitations::default());
        let scout = CitationScout::new(llm.clone(), Arc::new(FakePapers(Ok(vec![]))), 5)
            .with_citations(citations.clone());

        scout.work(&step("Assess the Impact of this paper")).await.unwrap();
        assert_eq!(citations.0.load(Ordering::SeqCst), 1);
        assert!(llm.requests()[0][1].content.contains("citedBy"));
    }

    #[tokio::test]
    async fn test_search_failure_is_folded_into_prompt() {
        let llm = Arc::new(ScriptedLlmClient::new(["Nothing found."]));
        let scout = CitationScout::new(
            llm.clone(),
            Arc::new(FakePapers(Err("connection refused".into()))),
            5,
        );
        let out = scout.work(&step("Find related work")).await.unwrap();
        assert_eq!(out.result, "Nothing found.");
        assert!(llm.requests()[0][1].content.contains("connection refused"));
    }
}
