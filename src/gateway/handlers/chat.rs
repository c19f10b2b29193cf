//! Chat 处理器

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::gateway::{error::RelayError, state::AppState};
use crate::utils::truncate_for_log;

/// debug 日志中 prompt/回复的最大字符数
const LOG_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /chat 处理器
///
/// 1. Generator 未初始化时直接返回 500，不发起网络请求
/// 2. 请求体无法解析或 `message` 缺失/为空时返回 400
/// 3. 将 `message` 原样转发给上游，成功时返回 `{"reply": ...}`
/// 4. 上游任何失败都记录日志并返回通用的 500
pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, RelayError> {
    let generator = state.generator().ok_or(RelayError::ModelUnavailable)?;

    let message = match payload {
        Ok(Json(ChatRequest {
            message: Some(message),
        })) if !message.is_empty() => message,
        Ok(_) => return Err(RelayError::NoMessage),
        Err(rejection) => {
            tracing::debug!(%rejection, "rejected chat body");
            return Err(RelayError::NoMessage);
        }
    };

    tracing::info!(
        provider = generator.name(),
        model = generator.model(),
        prompt_chars = message.chars().count(),
        "request"
    );
    tracing::debug!(
        prompt = %truncate_for_log(&message, LOG_PREVIEW_CHARS),
        "sending to upstream"
    );

    match generator.generate(&message).await {
        Ok(reply) => {
            tracing::info!(
                provider = generator.name(),
                reply_chars = reply.chars().count(),
                "response"
            );
            tracing::debug!(
                reply = %truncate_for_log(&reply, LOG_PREVIEW_CHARS),
                "received from upstream"
            );
            Ok(Json(ChatResponse { reply }))
        }
        Err(err) => {
            tracing::error!(
                provider = generator.name(),
                model = generator.model(),
                kind = err.kind(),
                error = %err,
                "upstream call failed"
            );
            Err(err.into())
        }
    }
}
