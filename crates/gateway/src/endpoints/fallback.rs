//! # 未定義ルート

use axum::http::{HeaderName, StatusCode};

use crate::cors::cors_headers;
use crate::error::GatewayError;

/// 一致しないパス・メソッド — 404 `{ "error": "Not found" }`
pub async fn handle_not_found() -> GatewayError {
    GatewayError::NotFound("Not found".to_string())
}

/// GET /favicon.ico — ブラウザの自動要求に空で応答する。
pub async fn handle_favicon() -> (StatusCode, [(HeaderName, &'static str); 3]) {
    (StatusCode::NO_CONTENT, cors_headers())
}
