//! 文档摄入：按页、按章节切分为带元数据的文本块
//!
//! 输入为已抽取的纯文本，页之间以换页符 `\x0C` 分隔（无换页符时视为单页）。
//! 短行若匹配常见论文章节标题则开启新章节；章节文本再按目标大小切分，块之间保留重叠。

use std::sync::OnceLock;

use regex::Regex;

use crate::rag::PassageMetadata;

const PAGE_BREAK: char = '\x0C';
/// 超过该长度的行不视为章节标题
const MAX_HEADER_CHARS: usize = 50;
const DEFAULT_SECTION: &str = "Introduction";

fn header_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(Introduction|Abstract|Methods?|Related Work|Results?|Discussion|Conclusion|References)",
        )
        .expect("valid section header regex")
    })
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// 合并连续空白并去除首尾空白
pub fn clean_text(text: &str) -> String {
    whitespace().replace_all(text, " ").trim().to_string()
}

/// 文档块：文本与定位元数据
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub metadata: PassageMetadata,
}

/// 分块策略
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// 目标块大小（字符数）
    pub chunk_size: usize,
    /// 块之间的重叠（字符数）
    pub chunk_overlap: usize,
    /// 断开位置的分隔符（优先级从高到低）
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 80,
            separators: vec![
                ". ".to_string(),
                "。".to_string(),
                "? ".to_string(),
                "! ".to_string(),
                "; ".to_string(),
                " ".to_string(),
            ],
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
            ..Default::default()
        }
    }
}

/// 将文本切成不超过 chunk_size 字符的片段（UTF-8 安全）
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let size = config.chunk_size.max(1);
    let mut pieces = Vec::new();
    let mut current = 0;

    while current < total {
        let target_end = (current + size).min(total);
        let mut end = target_end;

        // 非末尾时尽量在分隔符处断开
        if target_end < total {
            let slice: String = chars[current..target_end].iter().collect();
            for sep in &config.separators {
                if let Some(pos) = slice.rfind(sep.as_str()) {
                    let to_sep = slice[..pos].chars().count() + sep.chars().count();
                    if to_sep > 0 {
                        end = current + to_sep;
                        break;
                    }
                }
            }
        }
        if end <= current {
            end = (current + 1).min(total);
        }

        let piece: String = chars[current..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        if end >= total {
            break;
        }

        let overlap = config.chunk_overlap.min(end - current);
        let next = end.saturating_sub(overlap);
        current = if next > current { next } else { end };
    }

    pieces
}

/// 章节感知的页面解析：返回 (章节文本, 页码, 章节名)
fn parse_sections(text: &str) -> Vec<(String, usize, String)> {
    let mut sections = Vec::new();
    let mut current_section = DEFAULT_SECTION.to_string();

    for (page_idx, page) in text.split(PAGE_BREAK).enumerate() {
        let page_num = page_idx + 1;
        let mut acc = String::new();

        for line in page.lines() {
            let trimmed = line.trim();
            if trimmed.chars().count() < MAX_HEADER_CHARS && header_pattern().is_match(trimmed) {
                let cleaned = clean_text(&acc);
                if !cleaned.is_empty() {
                    sections.push((cleaned, page_num, current_section.clone()));
                }
                acc.clear();
                current_section = trimmed.to_string();
            } else {
                acc.push_str(line);
                acc.push(' ');
            }
        }

        let cleaned = clean_text(&acc);
        if !cleaned.is_empty() {
            sections.push((cleaned, page_num, current_section.clone()));
        }
    }

    sections
}

/// 将整篇文档切分为文本块，id 形如 `<source>_<n>`
pub fn chunk_document(source: &str, text: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for (section_text, page, section) in parse_sections(text) {
        for piece in split_text(&section_text, config) {
            chunks.push(Chunk {
                id: format!("{}_{}", source, chunks.len()),
                text: piece,
                metadata: PassageMetadata {
                    source: source.to_string(),
                    page,
                    section: section.clone(),
                },
            });
        }
    }
    chunks
}
