//! # GET /upload?id=...
//!
//! IDでオブジェクトを取得する。パスワード保護されたオブジェクトで資格情報が
//! ないか一致しない場合、パスワード入力を促すHTMLページを返し、
//! ブラウザに `password` 付きで同じURLを再要求させる。

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use tempdrop_types::{ObjectId, ObjectRecord, DEFAULT_CONTENT_TYPE};

use crate::access::{authorize, AccessDecision};
use crate::config::GatewayState;
use crate::cors::cors_headers;
use crate::error::GatewayError;
use crate::storage;

/// パスワード入力ページ。キャンセル時は何もしない。
const PASSWORD_PROMPT_HTML: &str = r#"<!DOCTYPE html>
<html>
	<head>
		<meta charset="utf-8">
		<title>Enter the password to download the file</title>
	</head>
	<body></body>
	<script>
		const password = window.prompt('Enter the password to download the file');
		if (password !== null) {
			const url = new URL(window.location.href);
			url.searchParams.set('password', password);
			window.location.href = url.toString();
		}
	</script>
</html>
"#;

/// ダウンロード要求のクエリ
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadQuery {
    pub id: Option<String>,
    pub password: Option<String>,
}

impl DownloadQuery {
    /// クエリのキー・値の組から構築する。同じキーが複数あれば最初の値を採用する。
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "id" => &mut query.id,
                "password" => &mut query.password,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// 資格情報の再入力を求めるレスポンス。
fn challenge_response() -> Response {
    (
        cors_headers(),
        [(header::CACHE_CONTROL, "no-store")],
        Html(PASSWORD_PROMPT_HTML),
    )
        .into_response()
}

/// オブジェクト本体のレスポンス。保存時のコンテンツタイプをそのまま返す。
fn object_response(record: ObjectRecord) -> Response {
    let content_type = HeaderValue::from_str(record.metadata.content_type_or_default())
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    ([(header::CONTENT_TYPE, content_type)], record.content).into_response()
}

/// GET /upload — オブジェクトの取得。
///
/// - `id` なし → 400
/// - 未作成・失効済み → 404（区別しない）
/// - 保護されていて資格情報が不一致 → パスワード入力ページ
/// - それ以外 → 本体
pub async fn handle_download(
    State(state): State<Arc<GatewayState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let Query(pairs) =
        query.map_err(|_| GatewayError::BadRequest("Invalid query".to_string()))?;
    let query = DownloadQuery::from_pairs(pairs);

    let id = query
        .id
        .filter(|id| !id.is_empty())
        .map(ObjectId::from_request)
        .ok_or_else(|| GatewayError::BadRequest("ID is required".to_string()))?;

    let record = storage::bounded(state.store_timeout, state.store.get(&id))
        .await?
        .ok_or_else(|| GatewayError::NotFound("File not found".to_string()))?;

    match authorize(&record, query.password.as_deref()) {
        AccessDecision::Challenge => {
            tracing::debug!(%id, credential = query.password.is_some(), "パスワード入力を要求");
            Ok(challenge_response())
        }
        AccessDecision::Grant => {
            tracing::debug!(%id, size = record.content.len(), "オブジェクトを返却");
            Ok(object_response(record))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::http::StatusCode;
    use tempdrop_types::ObjectMetadata;

    use crate::config::GatewayConfig;
    use crate::endpoints::test_helpers::{body_bytes, test_state, test_state_with};
    use crate::storage::{MemoryObjectStore, ObjectStore};

    async fn seed(
        store: &MemoryObjectStore,
        content: &[u8],
        content_type: Option<&str>,
        password: Option<&str>,
    ) -> ObjectId {
        let id = ObjectId::generate();
        let record = ObjectRecord {
            id: id.clone(),
            content: content.to_vec(),
            metadata: ObjectMetadata::from_upload(content_type.map(str::to_owned), password),
        };
        store.put(record, Duration::from_secs(60)).await.unwrap();
        id
    }

    fn query(
        id: Option<&str>,
        password: Option<&str>,
    ) -> Result<Query<Vec<(String, String)>>, QueryRejection> {
        let pairs = [("id", id), ("password", password)]
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v.to_string())))
            .collect();
        Ok(Query(pairs))
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_public_object_returns_bytes_and_content_type() {
        let (state, store) = test_state();
        let id = seed(&store, b"hello", Some("text/plain"), None).await;

        let response = handle_download(State(state), query(Some(id.as_str()), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
        assert_eq!(body_bytes(response).await, b"hello");
    }

    #[tokio::test]
    async fn test_missing_content_type_defaults_to_octet_stream() {
        let (state, store) = test_state();
        let id = seed(&store, b"\x00\xff", None, None).await;

        let response = handle_download(State(state), query(Some(id.as_str()), Some("ignored")))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_repeated_keys_take_first_value() {
        let query = DownloadQuery::from_pairs(pairs(&[
            ("id", "first"),
            ("password", "pw1"),
            ("id", "second"),
            ("other", "x"),
            ("password", "pw2"),
        ]));
        assert_eq!(query.id.as_deref(), Some("first"));
        assert_eq!(query.password.as_deref(), Some("pw1"));
    }

    #[tokio::test]
    async fn test_duplicate_id_serves_first_object() {
        let (state, store) = test_state();
        let first = seed(&store, b"first", Some("text/plain"), None).await;
        let second = seed(&store, b"second", Some("text/plain"), None).await;

        let response = handle_download(
            State(state),
            Ok(Query(pairs(&[("id", first.as_str()), ("id", second.as_str())]))),
        )
        .await
        .unwrap();
        assert_eq!(body_bytes(response).await, b"first");
    }

    /// ヘッダー値にできないコンテンツタイプは既定値で返す
    #[tokio::test]
    async fn test_unrepresentable_content_type_falls_back_to_default() {
        let (state, store) = test_state();
        let id = seed(&store, b"data", Some("text/plain\nX-Injected: 1"), None).await;

        let response = handle_download(State(state), query(Some(id.as_str()), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], DEFAULT_CONTENT_TYPE);
        assert!(response.headers().get("x-injected").is_none());
        assert_eq!(body_bytes(response).await, b"data");
    }

    #[tokio::test]
    async fn test_missing_or_empty_id_is_bad_request() {
        let (state, _) = test_state();
        let result = handle_download(State(state.clone()), query(None, None)).await;
        assert!(matches!(result, Err(GatewayError::BadRequest(ref m)) if m == "ID is required"));

        let result = handle_download(State(state), query(Some(""), None)).await;
        assert!(matches!(result, Err(GatewayError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (state, _) = test_state();
        let result = handle_download(State(state), query(Some("does-not-exist"), None)).await;
        assert!(matches!(result, Err(GatewayError::NotFound(ref m)) if m == "File not found"));
    }

    #[tokio::test]
    async fn test_protected_object_challenges_then_grants() {
        let (state, store) = test_state();
        let id = seed(&store, b"secret", None, Some("1234")).await;

        for credential in [None, Some("wrong"), Some("")] {
            let response = handle_download(State(state.clone()), query(Some(id.as_str()), credential))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html"));
            assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            let body = body_bytes(response).await;
            assert!(String::from_utf8(body).unwrap().contains("window.prompt"));
        }

        let response = handle_download(State(state), query(Some(id.as_str()), Some("1234")))
            .await
            .unwrap();
        assert_eq!(body_bytes(response).await, b"secret");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_object_is_not_found() {
        let (state, store) = test_state_with(GatewayConfig {
            object_ttl: Duration::from_secs(1),
            ..GatewayConfig::default()
        });
        let id = ObjectId::generate();
        let record = ObjectRecord {
            id: id.clone(),
            content: b"gone soon".to_vec(),
            metadata: ObjectMetadata::default(),
        };
        store.put(record, state.object_ttl).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        let result = handle_download(State(state), query(Some(id.as_str()), None)).await;
        assert!(matches!(result, Err(GatewayError::NotFound(ref m)) if m == "File not found"));
    }

    /// ストアが応答しない場合は上限時間でStoreUnavailableになる
    #[tokio::test(start_paused = true)]
    async fn test_stalled_store_is_unavailable() {
        struct StalledStore;

        #[async_trait::async_trait]
        impl ObjectStore for StalledStore {
            async fn put(&self, _: ObjectRecord, _: Duration) -> Result<(), storage::StoreError> {
                std::future::pending().await
            }
            async fn get(&self, _: &ObjectId) -> Result<Option<ObjectRecord>, storage::StoreError> {
                std::future::pending().await
            }
        }

        let config = GatewayConfig::default();
        let state = Arc::new(GatewayState::new(&config, Box::new(StalledStore)));
        let result = handle_download(State(state), query(Some("any"), None)).await;
        assert!(matches!(result, Err(GatewayError::StoreUnavailable(_))));
    }
}
