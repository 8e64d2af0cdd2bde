//! Quill - 面向研究论文问答的多 Agent 协调层
//!
//! 模块划分：
//! - **agents**: 协调者（规划 / 汇总）与三个专家 Agent（PDF 分析、引文检索、图表）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 状态与归约、路由、编排主循环、多轮会话
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock / Scripted）与嵌入
//! - **memory**: 会话对话记录
//! - **observability**: 日志初始化
//! - **plan**: 研究计划模型与 LLM 输出解析
//! - **rag**: 文档分块、分词、混合检索索引
//! - **tools**: arXiv 与 Scholar 检索客户端

pub mod agents;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod plan;
pub mod rag;
pub mod tools;
