//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `QUILL__*` 覆盖（双下划线表示嵌套，如 `QUILL__LLM__PROVIDER=mock`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub retrieval: RetrievalSection,
    pub search: SearchSection,
}

/// [app] 段：编排上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 规划连续解析失败的最大次数，超过后本轮以失败告终
    pub max_planning_attempts: usize,
    /// 单轮编排最多执行的节点数
    pub max_iterations: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_planning_attempts: 3,
            max_iterations: 64,
        }
    }
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openai / mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub embedding_model: String,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            embedding_model: "text-embedding-3-small".to_string(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [retrieval] 段：文档索引集合与分块参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub collection: String,
    /// 索引持久化目录，相对路径基于当前目录
    pub persist_dir: PathBuf,
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            collection: "research_papers".to_string(),
            persist_dir: PathBuf::from("chroma_db"),
            top_k: 5,
            chunk_size: 800,
            chunk_overlap: 80,
        }
    }
}

/// [search] 段：arXiv 与 Scholar 检索
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SearchSection {
    pub arxiv: ArxivSection,
    pub scholar: ScholarSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArxivSection {
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for ArxivSection {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScholarSection {
    pub num_results: usize,
    pub timeout_secs: u64,
    /// 保存 Serper API Key 的环境变量名
    pub api_key_env: String,
}

impl Default for ScholarSection {
    fn default() -> Self {
        Self {
            num_results: 5,
            timeout_secs: 15,
            api_key_env: "SERPER_API_KEY".to_string(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 QUILL__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 QUILL__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("QUILL")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
