//! Gemini Provider
//!
//! 通过 `generateContent` REST 接口进行单轮、非流式的文本生成

mod types;

use anyhow::Context;
use async_trait::async_trait;
use http::{header, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::providers::{Generator, ProviderError};
use crate::utils::{build_http_client, truncate_for_log};
use types::{GenerateContentRequest, GenerateContentResponse};

/// 记录到日志中的上游错误响应体最大长度
const ERROR_BODY_LOG_CHARS: usize = 500;

/// Gemini Provider 配置
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
    headers: HeaderMap,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> anyhow::Result<Self> {
        let client = build_http_client(config.timeout).context("Failed to create Gemini API client")?;
        let headers = build_headers(&config.api_key)?;
        Ok(Self {
            config,
            client,
            headers,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base, self.config.model
        )
    }
}

fn build_headers(api_key: &str) -> anyhow::Result<HeaderMap> {
    let mut map = HeaderMap::new();

    let mut key = HeaderValue::from_str(api_key).context("Invalid API key for header")?;
    key.set_sensitive(true);
    map.insert("x-goog-api-key", key);
    map.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    map.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    Ok(map)
}

/// 从 `generateContent` 响应中提取回复文本
fn extract_reply(response: GenerateContentResponse) -> Result<String, ProviderError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        return Err(ProviderError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| ProviderError::Malformed("response contains no candidates".into()))?;

    let text = candidate.text();
    if !text.is_empty() {
        return Ok(text);
    }

    match candidate.finish_reason.as_deref() {
        Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
            Err(ProviderError::Blocked(reason.to_string()))
        }
        other => Err(ProviderError::Malformed(format!(
            "candidate has no text (finish reason: {})",
            other.unwrap_or("none")
        ))),
    }
}

#[async_trait]
impl Generator for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .headers(self.headers.clone())
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited(truncate_for_log(
                &body,
                ERROR_BODY_LOG_CHARS,
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, ERROR_BODY_LOG_CHARS),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(format!("invalid JSON: {}", e)))?;

        extract_reply(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/models/test-model:generateContent";

    fn provider_for(server: &MockServer, timeout: Duration) -> GeminiProvider {
        GeminiProvider::new(GeminiConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            api_base: server.uri(),
            timeout,
        })
        .unwrap()
    }

    fn text_response(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn sends_prompt_with_key_header_and_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Hello there"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("General Kenobi")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(5));
        let reply = provider.generate("Hello there").await.unwrap();
        assert_eq!(reply, "General Kenobi");
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(
                ResponseTemplate::new(429).set_body_string(r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server, Duration::from_secs(5))
            .generate("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited(ref body) if body.contains("RESOURCE_EXHAUSTED")));
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = provider_for(&server, Duration::from_secs(5))
            .generate("hi")
            .await
            .unwrap_err();
        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_json_maps_to_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server, Duration::from_secs(5))
            .generate("hi")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[tokio::test]
    async fn blocked_prompt_maps_to_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"promptFeedback": {"blockReason": "SAFETY"}})),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server, Duration::from_secs(5))
            .generate("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Blocked(ref r) if r == "SAFETY"));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_response("too late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server, Duration::from_millis(200))
            .generate("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout));
    }

    #[test]
    fn empty_candidates_are_malformed() {
        let err = extract_reply(GenerateContentResponse::default()).unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn safety_finish_without_text_is_blocked() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert!(matches!(extract_reply(response), Err(ProviderError::Blocked(_))));
    }
}
