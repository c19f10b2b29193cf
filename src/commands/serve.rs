//! Serve 命令 - 启动中继服务器

use anyhow::Result;

use crate::config::Config;
use crate::gateway;

/// 执行服务器启动命令
///
/// # 功能
///
/// - 校验 Gemini API 密钥并构建上游客户端（失败时 `/chat` 不可用，服务仍然启动）
/// - 初始化 HTTP 路由和中间件
/// - 启动服务器并等待关闭信号（Ctrl+C 或 SIGTERM）
pub async fn serve_command(config: Config) -> Result<()> {
    gateway::serve(config).await
}
