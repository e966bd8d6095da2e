//! # Gatewayエンドポイント
//!
//! ## API エンドポイント
//! - `OPTIONS *` — CORSプリフライト
//! - `POST /upload` — オブジェクトの保存
//! - `GET /upload?id=...&password=...` — オブジェクトの取得
//! - `GET /favicon.ico` — 空応答
//! - その他 — 404

pub mod download;
pub mod fallback;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use download::handle_download;
pub use fallback::{handle_favicon, handle_not_found};
pub use upload::handle_upload;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::GatewayState;
use crate::cors::handle_preflight;

/// オブジェクトのアップロード・ダウンロードを受け付けるパス
pub const OBJECT_ENDPOINT: &str = "/upload";

/// Gatewayのルーターを構築する。
pub fn router(state: Arc<GatewayState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route(
            OBJECT_ENDPOINT,
            get(handle_download)
                .post(handle_upload)
                .fallback(handle_not_found),
        )
        .route("/favicon.ico", get(handle_favicon))
        .fallback(handle_not_found)
        .layer(body_limit)
        .layer(axum::middleware::from_fn(handle_preflight))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
