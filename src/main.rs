//! Quill 命令行入口
//!
//! 用法：quill [--config <path>] [--ingest <paper.txt>] <question>
//! 先可选地把文本化的论文写入索引，再对问题运行一次完整编排并打印计划、图表与答案。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use quill::agents::{AgentRoster, CitationScout, LeadResearcher, PdfAnalyst, VisualSpecialist};
use quill::config::{load_config, AppConfig};
use quill::core::{Orchestrator, ResearchSession};
use quill::llm::{create_embedder_from_config, create_llm_from_config};
use quill::rag::{ChunkingConfig, DocumentIndex};
use quill::tools::{ArxivClient, ScholarClient};

/// 针对一篇论文提问：规划、分派给专家 Agent、汇总答案
#[derive(Debug, Parser)]
#[command(version, about, name = "quill")]
struct CliArgs {
    /// 额外的 TOML 配置文件，覆盖 config/default.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// 提问前先把该纯文本论文（页间以换页符分隔）写入索引
    #[arg(long)]
    ingest: Option<PathBuf>,

    /// 问题，多个词按空格拼接
    #[arg(required = true)]
    question: Vec<String>,
}

impl CliArgs {
    fn question(&self) -> String {
        self.question.join(" ")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quill::observability::init();
    let args = CliArgs::parse();

    let cfg = load_config(args.config.clone()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let llm = create_llm_from_config(&cfg);
    let embedder =
        create_embedder_from_config(cfg.llm.base_url.as_deref(), &cfg.llm.embedding_model, None);

    let mut index = DocumentIndex::open(
        &cfg.retrieval.persist_dir,
        &cfg.retrieval.collection,
        embedder,
    )
    .context("Failed to open document index")?
    .with_chunking(ChunkingConfig::new(
        cfg.retrieval.chunk_size,
        cfg.retrieval.chunk_overlap,
    ));

    if let Some(path) = &args.ingest {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let chunks = index.ingest(&source, &text).await?;
        tracing::info!(source = %source, chunks, "paper ingested");
    }

    let analyst = PdfAnalyst::new(llm.clone(), Arc::new(index), cfg.retrieval.top_k);
    let scholar = ScholarClient::new(
        &cfg.search.scholar.api_key_env,
        cfg.search.scholar.num_results,
        cfg.search.scholar.timeout_secs,
    );
    let scout = CitationScout::new(
        llm.clone(),
        Arc::new(ArxivClient::new(cfg.search.arxiv.timeout_secs)),
        cfg.search.arxiv.max_results,
    )
    .with_citations(Arc::new(scholar));
    let roster = AgentRoster::new(
        Arc::new(analyst),
        Arc::new(scout),
        Arc::new(VisualSpecialist::new(llm.clone())),
    );
    let orchestrator =
        Orchestrator::new(LeadResearcher::new(llm.clone()), roster).with_limits(&cfg);
    let mut session = ResearchSession::new(orchestrator);

    let state = session
        .submit(&args.question())
        .await
        .context("Research run failed")?;

    if !state.plan.is_empty() {
        println!("Plan:\n{}", state.plan.render_status());
    }
    for diagram in &state.diagrams {
        println!("```mermaid\n{}\n```\n", diagram);
    }
    match &state.final_answer {
        Some(answer) => println!("{}", answer),
        None => {
            if let Some(last) = state.messages.last_assistant() {
                println!("{}", last.content);
            }
        }
    }

    let (prompt, completion, total) = llm.token_usage();
    tracing::info!(prompt, completion, total, "token usage");
    Ok(())
}
