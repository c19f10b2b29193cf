//! 应用配置模块
//!
//! 负责从环境变量加载应用配置，包括：
//! - 服务器监听地址和端口
//! - Gemini API 密钥、模型名称和 API 地址
//! - 上游请求超时

use anyhow::{Context, Result};
use std::time::Duration;

/// `.env` 模板中的占位密钥，视同未配置
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5001;
const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;

/// 应用配置
///
/// 包含服务器运行所需的所有配置项
#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器监听地址（如 "0.0.0.0" 或 "127.0.0.1"）
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 原始的 Gemini API 密钥，未经校验
    pub api_key: Option<String>,
    pub model: String,
    /// Gemini REST API 基础地址（测试时可指向 mock 服务器）
    pub api_base: String,
    /// 单次上游调用的超时时间
    pub upstream_timeout: Duration,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// # 环境变量
    ///
    /// - `RELAY_HOST`: 服务器监听地址（默认: "0.0.0.0"）
    /// - `RELAY_PORT`: 服务器监听端口（默认: 5001）
    /// - `GEMINI_API_KEY`: Gemini API 密钥（缺失时 `/chat` 不可用，但进程照常启动）
    /// - `GEMINI_MODEL`: 模型名称（默认: "gemini-1.5-flash-latest"）
    /// - `GEMINI_API_BASE`: API 基础地址
    /// - `RELAY_UPSTREAM_TIMEOUT_SECS`: 上游超时秒数（默认: 60）
    ///
    /// # 错误
    ///
    /// - 如果 `RELAY_PORT` 不是有效的端口号
    /// - 如果 `RELAY_UPSTREAM_TIMEOUT_SECS` 不是正整数
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意查找函数加载配置，便于测试时不修改进程环境
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("RELAY_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("RELAY_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("RELAY_PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let timeout_secs: u64 = match lookup("RELAY_UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("RELAY_UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            anyhow::bail!("RELAY_UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }

        let model = lookup("GEMINI_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base = lookup("GEMINI_API_BASE")
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            host,
            port,
            api_key: lookup("GEMINI_API_KEY"),
            model,
            api_base: api_base.trim_end_matches('/').to_string(),
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// 校验 API 密钥
    ///
    /// 缺失、空白或仍为占位值时返回错误。调用方据此决定 `/chat` 是否可用，
    /// 错误不会导致进程退出。
    pub fn validated_api_key(&self) -> Result<&str> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .context("GEMINI_API_KEY not found in environment or .env file")?;

        if key == PLACEHOLDER_API_KEY {
            anyhow::bail!("GEMINI_API_KEY is still set to the placeholder value");
        }

        Ok(key)
    }

    /// 本地服务器的基础 URL（供 `test` 命令使用）
    pub fn local_base_url(&self) -> String {
        let host = if self.host == "0.0.0.0" {
            "127.0.0.1"
        } else {
            self.host.as_str()
        };
        format!("http://{}:{}", host, self.port)
    }
}
