//! Gemini Relay - 极简的 Gemini 对话中继服务
//!
//! 暴露单个 `/chat` 端点，将消息原样转发给 Gemini `generateContent`
//! 接口，并以 JSON 返回生成的回复。
//!
//! # 功能特性
//!
//! - 启动时一次性校验 API 密钥，密钥缺失时服务照常运行但 `/chat` 返回 500
//! - 上游调用有固定超时，不重试
//! - 上游错误细节只写入日志，不返回给调用方
//!
//! # 命令行接口
//!
//! - `serve`: 启动中继服务器
//! - `test`: 向本地服务器发送测试消息

mod commands;
mod config;
mod gateway;
mod providers;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Gemini Relay CLI
#[derive(Parser)]
#[command(name = "gemini-relay")]
#[command(about = "Minimal HTTP relay for the Gemini API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 可用的命令
#[derive(Subcommand)]
enum Commands {
    /// 启动中继服务器
    Serve,
    /// 向本地服务器发送测试消息
    Test {
        /// 要发送的消息
        #[arg(short, long, default_value = "Hello, Gemini! Please reply with a short greeting.")]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env 文件（如果存在）
    if let Ok(dotenv_path) = std::env::var("RELAY_ENV_FILE") {
        dotenvy::from_path(&dotenv_path).ok();
    } else {
        dotenvy::dotenv().ok();
    }

    // 初始化日志系统
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_relay=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    // 解析命令行参数和配置
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // 执行相应的命令
    match cli.command {
        Commands::Serve => commands::serve_command(config).await,
        Commands::Test { message } => commands::test_command(config, message).await,
    }
}
