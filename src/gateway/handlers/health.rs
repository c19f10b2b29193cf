//! 健康检查处理器

use axum::{extract::State, Json};
use serde::Serialize;

use crate::gateway::state::AppState;

pub const ROOT_BODY: &str = "Gemini relay is running!";

/// 健康检查响应
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    model_ready: bool,
}

/// GET /
pub async fn handle_root() -> &'static str {
    ROOT_BODY
}

/// GET /health
///
/// 进程存活即返回 200；`model_ready` 反映 `/chat` 是否可用
pub async fn handle_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let generator = state.generator();

    Json(serde_json::json!(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: generator.map(|g| g.model().to_string()),
        model_ready: state.is_ready(),
    }))
}
