//! arXiv 论文检索：调用 export.arxiv.org Atom API，按相关度排序

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use crate::tools::{Paper, PaperSearch};

const ARXIV_API: &str = "https://export.arxiv.org/api/query";
const USER_AGENT: &str = concat!("quill/", env!("CARGO_PKG_VERSION"));

pub struct ArxivClient {
    client: Client,
    endpoint: String,
}

impl ArxivClient {
    pub fn new(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: ARXIV_API.to_string(),
        }
    }

    /// 替换 API 地址（镜像或本地桩服务）
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl PaperSearch for ArxivClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, String> {
        tracing::info!(query = %query, max_results, "arxiv search");
        let max = max_results.to_string();
        let search_query = format!("all:{}", query);
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max.as_str()),
                ("sortBy", "relevance"),
            ])
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let body = resp.text().await.map_err(|e| format!("Read body: {}", e))?;
        let mut papers = parse_atom_feed(&body);
        papers.truncate(max_results);
        Ok(papers)
    }
}

struct AtomPatterns {
    entry: Regex,
    title: Regex,
    summary: Regex,
    author: Regex,
    published: Regex,
    pdf_link: Regex,
    id: Regex,
    char_ref: Regex,
}

fn patterns() -> &'static AtomPatterns {
    static RE: OnceLock<AtomPatterns> = OnceLock::new();
    RE.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid atom regex");
        AtomPatterns {
            entry: re(r"(?s)<entry>(.*?)</entry>"),
            title: re(r"(?s)<title[^>]*>(.*?)</title>"),
            summary: re(r"(?s)<summary[^>]*>(.*?)</summary>"),
            author: re(r"(?s)<author>\s*<name>(.*?)</name>"),
            published: re(r"<published>(.*?)</published>"),
            pdf_link: re(r#"<link[^>]*title="pdf"[^>]*href="([^"]+)""#),
            id: re(r"<id>(.*?)</id>"),
            char_ref: re(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));"),
        }
    })
}

/// 先解码数字字符引用（&#39; / &#x2013;），再解码命名实体，&amp; 最后处理
fn unescape_xml(s: &str) -> String {
    let decoded = patterns().char_ref.replace_all(s, |c: &regex::Captures| {
        let code = match (c.get(1), c.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| c[0].to_string())
    });
    decoded
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn collapse(s: &str) -> String {
    unescape_xml(&s.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// RFC 3339 时间戳只保留日期部分；无法解析时原样返回
fn published_day(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// 解析 Atom feed 中的 entry；字段缺失时留空，不视为错误
pub fn parse_atom_feed(xml: &str) -> Vec<Paper> {
    let p = patterns();
    let capture = |re: &Regex, text: &str| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| collapse(m.as_str()))
            .unwrap_or_default()
    };

    p.entry
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| {
            let entry = m.as_str();
            let url = p
                .pdf_link
                .captures(entry)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| capture(&p.id, entry));
            Paper {
                title: capture(&p.title, entry),
                summary: capture(&p.summary, entry),
                authors: p
                    .author
                    .captures_iter(entry)
                    .filter_map(|c| c.get(1))
                    .map(|m| collapse(m.as_str()))
                    .collect(),
                url,
                published_date: published_day(&capture(&p.published, entry)),
            }
        })
        .collect()
}
