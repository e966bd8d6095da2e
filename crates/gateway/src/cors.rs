//! # CORS
//!
//! 全てのJSON/HTMLレスポンスとプリフライトに付与するクロスオリジン許可ヘッダー。
//! オブジェクト本体のレスポンスには付与しない。

use axum::extract::Request;
use axum::http::{header, HeaderName, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// 許可するメソッド
pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
/// 許可するリクエストヘッダー
pub const ALLOWED_HEADERS: &str = "Content-Type";

/// レスポンスに付与するCORSヘッダー一式。
pub fn cors_headers() -> [(HeaderName, &'static str); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS),
    ]
}

/// OPTIONS — プリフライト応答。
///
/// パスに関わらず 204 + CORSヘッダーを返し、ルーティングとストアには到達させない。
pub async fn handle_preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return (StatusCode::NO_CONTENT, cors_headers()).into_response();
    }
    next.run(request).await
}
