//! 检索层：文档摄入、分词、可持久化的文档索引
//!
//! Agent 只依赖 RetrievalIndex trait；索引由调用方按集合构建一次后以 Arc 传入。

pub mod index;
pub mod ingestion;
pub mod tokenizer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use index::DocumentIndex;
pub use ingestion::{chunk_document, Chunk, ChunkingConfig};

/// 文本块的来源定位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMetadata {
    pub source: String,
    /// 1 起始页码
    pub page: usize,
    pub section: String,
}

/// 检索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    pub metadata: PassageMetadata,
    pub score: f32,
}

/// 检索能力：返回至多 k 条按相关度排序的段落，可能少于 k 或为空
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>, String>;
}
