//! # エンドポイントテスト用共通ヘルパー
//!
//! upload, downloadテストで共有する状態構築とリクエストボディ生成。

use std::sync::Arc;

use crate::config::{GatewayConfig, GatewayState};
use crate::storage::MemoryObjectStore;

/// テスト用multipartの境界文字列
pub const MULTIPART_BOUNDARY: &str = "tempdrop-test-boundary";

/// インメモリストアを使うGatewayStateを構築する。
/// ストアのクローンを返すので、テストから直接中身を確認できる。
pub fn test_state() -> (Arc<GatewayState>, MemoryObjectStore) {
    test_state_with(GatewayConfig::default())
}

pub fn test_state_with(config: GatewayConfig) -> (Arc<GatewayState>, MemoryObjectStore) {
    let store = MemoryObjectStore::new();
    let state = Arc::new(GatewayState::new(&config, Box::new(store.clone())));
    (state, store)
}

/// `(フィールド名, パートのContent-Type, 内容)` からmultipartボディを組み立てる。
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content_type, data) in parts {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        match content_type {
            Some(ct) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"upload.bin\"\r\n\
                         Content-Type: {ct}\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// レスポンスボディを全て読み取る。
pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
