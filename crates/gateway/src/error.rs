//! # Gateway エラー型
//!
//! 全エンドポイントで共通のエラー型。境界で `{ "error": "..." }` 形式の
//! JSONレスポンスに変換する。内部の詳細はログにのみ出力する。

use axum::http::StatusCode;
use axum::Json;
use tempdrop_types::ErrorResponse;

use crate::cors::cors_headers;
use crate::storage::StoreError;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト（必須パラメータ欠落、multipartのパース失敗）
    #[error("{0}")]
    BadRequest(String),
    /// オブジェクトが存在しない。失効済みと未作成は区別しない
    #[error("{0}")]
    NotFound(String),
    /// リクエストボディがトランスポートの上限を超えた
    #[error("リクエストボディが上限を超えています: {0}")]
    PayloadTooLarge(String),
    /// ストレージに到達できない、またはタイムアウト
    #[error("ストレージに接続できません: {0}")]
    StoreUnavailable(String),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl GatewayError {
    /// クライアントに返すメッセージ。
    fn public_message(&self) -> String {
        match self {
            GatewayError::BadRequest(msg) | GatewayError::NotFound(msg) => msg.clone(),
            GatewayError::PayloadTooLarge(_) => "Payload too large".to_string(),
            GatewayError::StoreUnavailable(_) => "Storage unavailable".to_string(),
            GatewayError::Internal(_) => "Internal error".to_string(),
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => GatewayError::StoreUnavailable(msg),
            StoreError::Corrupt(msg) => GatewayError::Internal(msg),
        }
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match &self {
            GatewayError::StoreUnavailable(_) => tracing::warn!(error = %self, "ストレージ障害"),
            GatewayError::Internal(_) => tracing::error!(error = %self, "内部エラー"),
            _ => tracing::debug!(error = %self, status = %status, "リクエストを拒否"),
        }
        let body = ErrorResponse {
            error: self.public_message(),
        };
        (status, cors_headers(), Json(body)).into_response()
    }
}
