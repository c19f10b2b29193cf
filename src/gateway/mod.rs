//! Gateway 应用层
//!
//! HTTP 服务器和请求处理

mod error;
mod handlers;
mod middleware;
mod state;

pub use handlers::chat::ChatResponse;
pub use state::AppState;

use anyhow::Result;
use axum::{
    error_handling::HandleErrorLayer,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::providers::{self, ProviderError};
use error::RelayError;

/// 整体请求超时比上游超时多出的余量，保证上游超时先触发并返回 JSON 错误
const REQUEST_TIMEOUT_MARGIN_SECS: u64 = 5;

pub async fn serve(config: Config) -> Result<()> {
    let generator = match providers::create_generator(&config) {
        Ok(generator) => {
            tracing::info!(model = generator.model(), "Gemini API configured successfully");
            Some(generator)
        }
        Err(e) => {
            tracing::error!("Error configuring Gemini API: {:#}", e);
            tracing::warn!("/chat will answer 500 until the API key is fixed and the server restarted");
            None
        }
    };

    let state = AppState::new(generator);
    let request_timeout = config.upstream_timeout + Duration::from_secs(REQUEST_TIMEOUT_MARGIN_SECS);
    let app = build_router(state, request_timeout);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(handlers::handle_root))
        .route("/health", get(handlers::handle_health))
        .route("/chat", post(handlers::handle_chat))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_logger))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(HandleErrorLayer::new(handle_layer_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

/// 将超时层的错误映射为与上游失败相同的 JSON 500
async fn handle_layer_error(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        tracing::warn!("request exceeded the overall timeout");
        RelayError::Upstream(ProviderError::Timeout).into_response()
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        RelayError::Upstream(ProviderError::Network(err.to_string())).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    tokio::select! {
        _ = ctrl_c => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
