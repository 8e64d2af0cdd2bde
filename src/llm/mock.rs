//! 离线 LLM 客户端
//!
//! - MockLlmClient：按 system 提示中的角色给出固定输出，无需 API 即可跑通完整编排流程
//! - ScriptedLlmClient：按顺序返回预设回复并记录每次请求，用于测试

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};

/// Mock 客户端：根据 system 提示识别角色
#[derive(Debug, Default)]
pub struct MockLlmClient;

const MOCK_PLAN: &str = r#"```json
[
  {"description": "Summarize the core contribution of the uploaded paper", "assigned_agent": "PDF_Analyst"},
  {"description": "Find related work on arXiv", "assigned_agent": "Citation_Scout"},
  {"description": "Draw a flowchart of the proposed method", "assigned_agent": "Visual_Specialist"}
]
```"#;

fn first_line(messages: &[Message], role: Role) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == role)
        .and_then(|m| m.content.lines().find(|l| !l.trim().is_empty()))
        .map(str::trim)
        .unwrap_or("(no input)")
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let system = first_line(messages, Role::System);
        let task = first_line(messages, Role::User);

        let reply = if system.contains("Lead Researcher in an advanced agentic lab") {
            MOCK_PLAN.to_string()
        } else if system.contains("Synthesize the findings") {
            format!("Mock synthesis for {}", task)
        } else if system.contains("Visual Specialist") {
            "```mermaid\ngraph TD\n  Input --> Method --> Result\n```".to_string()
        } else {
            format!("Mock answer for {}", task)
        };
        Ok(reply)
    }
}

/// 脚本化客户端：按顺序弹出预设回复，脚本耗尽时返回错误
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|s| Ok(s.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 追加一条失败回复
    pub fn push_error(&self, error: impl Into<String>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(Err(error.into()));
        }
    }

    /// 已收到的请求（按调用顺序）
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        if let Ok(mut r) = self.requests.lock() {
            r.push(messages.to_vec());
        }
        self.replies
            .lock()
            .map_err(|e| e.to_string())?
            .pop_front()
            .unwrap_or_else(|| Err("scripted replies exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let llm = ScriptedLlmClient::new(["one", "two"]);
        llm.push_error("boom");
        let msgs = [Message::user("hi")];
        assert_eq!(llm.complete(&msgs).await.unwrap(), "one");
        assert_eq!(llm.complete(&msgs).await.unwrap(), "two");
        assert_eq!(llm.complete(&msgs).await.unwrap_err(), "boom");
        assert!(llm.complete(&msgs).await.is_err());
        assert_eq!(llm.call_count(), 4);
    }

    #[tokio::test]
    async fn test_mock_visual_reply_is_fenced() {
        let msgs = [
            Message::system("You are a Visual Specialist. Create valid Mermaid diagrams."),
            Message::user("Task: draw it"),
        ];
        let reply = MockLlmClient.complete(&msgs).await.unwrap();
        assert!(reply.starts_with("```mermaid"));
    }
}
