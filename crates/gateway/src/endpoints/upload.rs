//! # POST /upload
//!
//! リクエストボディ全体を読み取り、新しいIDでオブジェクトを保存する。
//!
//! ## 受け付ける形式
//! - `multipart/form-data`: `file`（必須）, `content-type`, `password`
//! - それ以外: ボディ全体を本体とし、`Content-Type` ヘッダーをコンテンツタイプとする
//!
//! サイズ上限はトランスポート（`DefaultBodyLimit`）に委ねる。

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::Json;
use tempdrop_types::{ObjectId, ObjectMetadata, ObjectRecord, UploadResponse};

use crate::config::GatewayState;
use crate::cors::cors_headers;
use crate::error::GatewayError;
use crate::storage;

/// multipartのフィールド名
const FIELD_FILE: &str = "file";
const FIELD_CONTENT_TYPE: &str = "content-type";
const FIELD_PASSWORD: &str = "password";

/// パース済みのアップロード内容
#[derive(Debug)]
struct ParsedUpload {
    content: Vec<u8>,
    content_type: Option<String>,
    password: Option<String>,
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

fn multipart_error(e: MultipartError) -> GatewayError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(e.body_text())
    } else {
        GatewayError::BadRequest("Invalid multipart body".to_string())
    }
}

/// multipartフォームを読み取る。未知のフィールドは無視する。
async fn read_multipart(mut multipart: Multipart) -> Result<ParsedUpload, GatewayError> {
    let mut content = None;
    let mut file_content_type = None;
    let mut content_type = None;
    let mut password = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FIELD_FILE) => {
                file_content_type = field.content_type().map(str::to_owned);
                content = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            Some(FIELD_CONTENT_TYPE) => {
                content_type = Some(field.text().await.map_err(multipart_error)?);
            }
            Some(FIELD_PASSWORD) => {
                password = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| GatewayError::BadRequest("File is required".to_string()))?;

    // フォームの content-type フィールドを優先し、空ならファイルパート自身の型を使う
    let content_type = content_type
        .filter(|ct| !ct.trim().is_empty())
        .or(file_content_type);

    Ok(ParsedUpload {
        content,
        content_type,
        password,
    })
}

/// 生のボディを読み取る。
async fn read_raw(request: Request, state: &Arc<GatewayState>) -> Result<ParsedUpload, GatewayError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let body = Bytes::from_request(request, state).await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            GatewayError::PayloadTooLarge(e.body_text())
        } else {
            GatewayError::BadRequest("Invalid request body".to_string())
        }
    })?;

    Ok(ParsedUpload {
        content: body.to_vec(),
        content_type,
        password: None,
    })
}

/// POST /upload — オブジェクトの保存。
///
/// IDを払い出し、TTL付きでストアに保存してIDを返す。
pub async fn handle_upload(
    State(state): State<Arc<GatewayState>>,
    request: Request,
) -> Result<([(HeaderName, &'static str); 3], Json<UploadResponse>), GatewayError> {
    let upload = if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|_| GatewayError::BadRequest("Invalid multipart body".to_string()))?;
        read_multipart(multipart).await?
    } else {
        read_raw(request, &state).await?
    };

    let metadata = ObjectMetadata::from_upload(upload.content_type, upload.password.as_deref());
    let protected = metadata.is_protected();
    let size = upload.content.len();

    let id = ObjectId::generate();
    let record = ObjectRecord {
        id: id.clone(),
        content: upload.content,
        metadata,
    };

    storage::bounded(state.store_timeout, state.store.put(record, state.object_ttl)).await?;

    // 失効時刻のUNIXタイムスタンプ
    let expires_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| GatewayError::Internal(format!("時刻取得失敗: {e}")))?
        .as_secs()
        .saturating_add(state.object_ttl.as_secs());

    tracing::info!(%id, size, protected, "オブジェクトを保存しました");

    Ok((cors_headers(), Json(UploadResponse { id, expires_at })))
}
