//! Google Scholar 检索（经 Serper API）：查询论文被引与影响力
//!
//! 需要 API Key；缺少 Key 或请求失败时返回 `{"error": ...}`，不抛出错误。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::tools::CitationSearch;

const SERPER_SCHOLAR: &str = "https://google.serper.dev/scholar";

pub struct ScholarClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    api_key_env: String,
    num_results: usize,
}

impl ScholarClient {
    /// api_key_env 为保存 Key 的环境变量名，缺失时在检索时给出对应错误
    pub fn new(api_key_env: &str, num_results: usize, timeout_secs: u64) -> Self {
        let api_key = std::env::var(api_key_env).ok().filter(|k| !k.trim().is_empty());
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: SERPER_SCHOLAR.to_string(),
            api_key,
            api_key_env: api_key_env.to_string(),
            num_results,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn post(&self, api_key: &str, query: &str) -> Result<Value, String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query, "num": self.num_results }))
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| format!("Invalid response: {}", e))
    }
}

#[async_trait]
impl CitationSearch for ScholarClient {
    async fn search(&self, query: &str) -> Value {
        let Some(api_key) = self.api_key.as_deref() else {
            return json!({ "error": format!("{} not set", self.api_key_env) });
        };
        tracing::info!(query = %query, "scholar search");
        match self.post(api_key, query).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "scholar search failed");
                json!({ "error": e })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_yields_error_object() {
        let client = ScholarClient::new("QUILL_TEST_UNSET_SERPER_KEY", 5, 5).with_api_key(None);
        let result = client.search("attention is all you need").await;
        assert_eq!(result["error"], "QUILL_TEST_UNSET_SERPER_KEY not set");
    }

    #[tokio::test]
    async fn test_network_failure_yields_error_object() {
        let client = ScholarClient::new("QUILL_TEST_UNSET_SERPER_KEY", 5, 2)
            .with_api_key(Some("key".to_string()))
            .with_endpoint("http://127.0.0.1:9/scholar");
        let result = client.search("anything").await;
        assert!(result.get("error").and_then(Value::as_str).is_some());
    }
}
