use reqwest::Client;
use std::time::Duration;

/// 是否禁用 TLS 验证（用于调试 mitmproxy 等场景）
pub fn should_disable_tls_verify() -> bool {
    std::env::var("RELAY_DISABLE_TLS_VERIFY")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// 构建上游 HTTP 客户端
///
/// 所有请求都带有固定的超时时间，避免上游无响应时 handler 无限期挂起。
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .user_agent(user_agent())
        .pool_max_idle_per_host(10);

    if should_disable_tls_verify() {
        tracing::warn!("TLS certificate verification is DISABLED - for debugging only!");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build()
}

pub fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// 截断过长的文本，用于日志输出
///
/// 按字符边界截断，超出部分以 "..." 结尾
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
