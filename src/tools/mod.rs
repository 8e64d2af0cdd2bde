//! 外部检索工具：arXiv 论文检索、Scholar 被引检索
//!
//! Citation_Scout 只依赖 PaperSearch / CitationSearch 两个 trait，测试中可替换为桩实现。

pub mod arxiv;
pub mod scholar;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use arxiv::ArxivClient;
pub use scholar::ScholarClient;

/// 论文检索结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub url: String,
    pub published_date: String,
}

/// 外部论文检索（尽力而为，失败返回错误字符串，由调用方折叠为 `{error}`）
#[async_trait]
pub trait PaperSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, String>;
}

/// 被引/影响力检索：总是返回 JSON，失败时为 `{"error": reason}`
#[async_trait]
pub trait CitationSearch: Send + Sync {
    async fn search(&self, query: &str) -> Value;
}
