//! 测试用 Generator

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{Generator, ProviderError};

/// 回显 prompt 的 mock，可配置为总是失败，并记录调用次数
#[derive(Default)]
pub struct MockGenerator {
    calls: AtomicUsize,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl MockGenerator {
    pub fn echo() -> Self {
        Self::default()
    }

    /// 每次调用都返回带有给定细节的上游错误
    pub fn failing(detail: impl Into<String>) -> Self {
        Self {
            failure: Some(detail.into()),
            ..Self::default()
        }
    }

    /// 回显前先等待给定时长
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// echo 模式下对给定输入的确定性输出
    pub fn expected_reply(prompt: &str) -> String {
        format!("echo: {}", prompt)
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(detail) => Err(ProviderError::Status {
                status: 429,
                body: detail.clone(),
            }),
            None => Ok(Self::expected_reply(prompt)),
        }
    }
}
