//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Mock / Scripted）

pub mod embedding;
pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

pub use embedding::{create_embedder_from_config, EmbeddingProvider, OpenAiEmbedder};
pub use mock::{MockLlmClient, ScriptedLlmClient};
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::{complete_with_system, LlmClient};

use crate::config::AppConfig;

/// 根据配置与环境变量选择 LLM 后端；provider 为 mock 或缺少 OPENAI_API_KEY 时使用 Mock
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_key = std::env::var("OPENAI_API_KEY")
        .map(|k| !k.is_empty())
        .unwrap_or(false);

    if provider != "mock" && (has_key || cfg.llm.base_url.is_some()) {
        tracing::info!(model = %cfg.llm.model, "Using OpenAI-compatible LLM");
        Arc::new(
            OpenAiClient::new(cfg.llm.base_url.as_deref(), &cfg.llm.model, None)
                .with_timeout(Duration::from_secs(cfg.llm.timeouts.request)),
        )
    } else {
        tracing::warn!(provider = %provider, "No API key set or mock requested, using Mock LLM");
        Arc::new(MockLlmClient)
    }
}
