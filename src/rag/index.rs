//! 文档索引：向量 + 关键词混合检索，按集合名持久化到本地目录
//!
//! 每个集合对应 `<persist_dir>/<collection>.json`。没有嵌入提供方时只做关键词检索。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::AgentError;
use crate::llm::EmbeddingProvider;
use crate::rag::ingestion::{chunk_document, Chunk, ChunkingConfig};
use crate::rag::tokenizer;
use crate::rag::{Passage, RetrievalIndex};

/// RRF 常数
const RRF_K: f32 = 60.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: Chunk,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    embedding: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    collection: String,
    entries: Vec<IndexEntry>,
}

/// 单个集合的文档索引
pub struct DocumentIndex {
    collection: String,
    path: Option<PathBuf>,
    entries: Vec<IndexEntry>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    chunking: ChunkingConfig,
}

impl DocumentIndex {
    /// 不落盘的索引（测试或一次性使用）
    pub fn in_memory(
        collection: impl Into<String>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Self {
        Self {
            collection: collection.into(),
            path: None,
            entries: Vec::new(),
            embedder,
            chunking: ChunkingConfig::default(),
        }
    }

    /// 打开 persist_dir 下的集合；文件不存在时为空索引，首次写入时创建
    pub fn open(
        persist_dir: impl AsRef<Path>,
        collection: &str,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Result<Self, AgentError> {
        let path = persist_dir.as_ref().join(format!("{}.json", collection));
        let entries = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            let file: IndexFile = serde_json::from_str(&data)?;
            if file.collection != collection {
                return Err(AgentError::Retrieval(format!(
                    "{} holds collection '{}', expected '{}'",
                    path.display(),
                    file.collection,
                    collection
                )));
            }
            file.entries
        } else {
            Vec::new()
        };
        tracing::info!(collection, chunks = entries.len(), path = %path.display(), "document index opened");

        Ok(Self {
            collection: collection.to_string(),
            path: Some(path),
            entries,
            embedder,
            chunking: ChunkingConfig::default(),
        })
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 摄入一篇文档：替换同一来源的旧块，分块、嵌入并持久化，返回块数
    ///
    /// 单块嵌入失败只记录警告，该块仍参与关键词检索。
    pub async fn ingest(&mut self, source: &str, text: &str) -> Result<usize, AgentError> {
        self.entries.retain(|e| e.chunk.metadata.source != source);

        let chunks = chunk_document(source, text, &self.chunking);
        let count = chunks.len();
        for chunk in chunks {
            let embedding = match &self.embedder {
                Some(embedder) => embedder.embed(&chunk.text).await.unwrap_or_else(|e| {
                    tracing::warn!(chunk = %chunk.id, error = %e, "embedding failed, keyword-only");
                    Vec::new()
                }),
                None => Vec::new(),
            };
            self.entries.push(IndexEntry { chunk, embedding });
        }

        self.save()?;
        tracing::info!(collection = %self.collection, source, chunks = count, "document ingested");
        Ok(count)
    }

    /// 写入持久化文件；内存索引为空操作
    pub fn save(&self) -> Result<(), AgentError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = IndexFile {
            collection: self.collection.clone(),
            entries: self.entries.clone(),
        };
        std::fs::write(path, serde_json::to_string(&file)?)?;
        Ok(())
    }

    async fn vector_ranking(&self, query: &str) -> Vec<usize> {
        let Some(embedder) = &self.embedder else {
            return Vec::new();
        };
        let query_embedding = match embedder.embed(query).await {
            Ok(v) if !v.is_empty() => v,
            Ok(_) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "query embedding failed, keyword-only");
                return Vec::new();
            }
        };

        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (cosine_similarity(&query_embedding, &e.embedding), i))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, i)| i).collect()
    }

    fn keyword_ranking(&self, query: &str) -> Vec<usize> {
        let query_tokens = tokenizer::tokenize_to_set(query);
        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let tokens = tokenizer::tokenize_to_set(&e.chunk.text);
                (tokenizer::jaccard_similarity(&query_tokens, &tokens), i)
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, i)| i).collect()
    }

    /// 混合检索：向量与关键词排名做 Reciprocal Rank Fusion
    pub async fn hybrid_search(&self, query: &str, k: usize) -> Vec<Passage> {
        if k == 0 || self.entries.is_empty() {
            return Vec::new();
        }
        let vector = self.vector_ranking(query).await;
        let keyword = self.keyword_ranking(query);

        let mut scores: HashMap<usize, f32> = HashMap::new();
        for ranking in [&vector, &keyword] {
            for (rank, idx) in ranking.iter().take(k * 2).enumerate() {
                *scores.entry(*idx).or_insert(0.0) += 1.0 / (RRF_K + rank as f32);
            }
        }

        let mut fused: Vec<(usize, f32)> = scores.into_iter().collect();
        // 分数相同时按摄入顺序，保证结果确定
        fused.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        fused
            .into_iter()
            .take(k)
            .map(|(idx, score)| {
                let chunk = &self.entries[idx].chunk;
                Passage {
                    content: chunk.text.clone(),
                    metadata: chunk.metadata.clone(),
                    score,
                }
            })
            .collect()
    }
}

#[async_trait]
impl RetrievalIndex for DocumentIndex {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>, String> {
        Ok(self.hybrid_search(query, k).await)
    }
}

/// 余弦相似度
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
