//! Provider 抽象层
//!
//! 定义上游文本生成服务的统一接口，启动时根据配置构建一次，之后只读共享

pub mod gemini;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use gemini::{GeminiConfig, GeminiProvider};

/// 上游调用失败的分类
///
/// 仅用于日志；返回给调用方的错误信息统一为通用文本
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream request timed out")]
    Timeout,

    #[error("rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("prompt blocked by upstream: {0}")]
    Blocked(String),

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// 简短的错误类别，用作结构化日志字段
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Network(_) => "network",
            ProviderError::Timeout => "timeout",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::Status { .. } => "status",
            ProviderError::Blocked(_) => "blocked",
            ProviderError::Malformed(_) => "malformed",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Generator Trait - 单轮文本生成
///
/// 输入一条 prompt，返回一段完整的生成文本。不支持流式输出。
#[async_trait]
pub trait Generator: Send + Sync {
    /// Provider 名称（用于日志和标识）
    fn name(&self) -> &str;
    /// 使用的模型名称
    fn model(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// 根据配置创建 Generator
///
/// 密钥缺失或为占位值时返回错误，调用方记录日志后以"未初始化"状态继续运行。
pub fn create_generator(config: &Config) -> anyhow::Result<Arc<dyn Generator>> {
    let api_key = config.validated_api_key()?;

    let provider = GeminiProvider::new(GeminiConfig {
        api_key: api_key.to_string(),
        model: config.model.clone(),
        api_base: config.api_base.clone(),
        timeout: config.upstream_timeout,
    })?;

    Ok(Arc::new(provider))
}
