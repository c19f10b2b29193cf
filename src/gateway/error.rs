//! 请求处理错误及其 HTTP 映射

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::providers::ProviderError;

pub const MODEL_UNAVAILABLE_MESSAGE: &str =
    "Generative model not initialized. Check API key and server logs.";
pub const NO_MESSAGE_MESSAGE: &str = "No message provided";
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to get response from AI";

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// `/chat` 的失败结果
#[derive(Debug, Error)]
pub enum RelayError {
    /// 启动时未能构建 Generator
    #[error("generative model not initialized")]
    ModelUnavailable,

    /// 请求体无法解析，或 `message` 缺失/为空
    #[error("no message provided")]
    NoMessage,

    #[error(transparent)]
    Upstream(#[from] ProviderError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::NoMessage => StatusCode::BAD_REQUEST,
            RelayError::ModelUnavailable | RelayError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回给调用方的固定文本，不包含任何上游细节
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::ModelUnavailable => MODEL_UNAVAILABLE_MESSAGE,
            RelayError::NoMessage => NO_MESSAGE_MESSAGE,
            RelayError::Upstream(_) => UPSTREAM_FAILURE_MESSAGE,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
