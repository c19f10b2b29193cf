//! Gateway 应用状态

use std::sync::Arc;

use crate::providers::Generator;

/// Gateway 应用状态
///
/// 启动时构建一次，之后只读。`generator` 为 None 表示密钥未配置，
/// `/chat` 将始终返回 500。
#[derive(Clone)]
pub struct AppState {
    generator: Option<Arc<dyn Generator>>,
}

impl AppState {
    pub fn new(generator: Option<Arc<dyn Generator>>) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> Option<&Arc<dyn Generator>> {
        self.generator.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.generator.is_some()
    }
}
