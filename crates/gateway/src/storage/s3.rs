//! # S3互換 オブジェクトストア
//!
//! AWS S3, MinIO, Cloudflare R2 等のS3互換APIを使用するバックエンド。
//!
//! 1レコード = 1オブジェクト。メタデータ・失効時刻・本体を `bincode` の
//! エンベロープにまとめて単一のPUTで書き込むため、部分的な書き込みは観測されない。
//! 失効時刻を過ぎたレコードは読み取り時に存在しないものとして扱い、削除を試みる。
//! 媒体側の退避はバケットのライフサイクルルールで行う想定。

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use s3::error::S3Error;
use serde::{Deserialize, Serialize};
use tempdrop_types::{ObjectId, ObjectMetadata, ObjectRecord};

use super::{ObjectStore, StoreError};

/// オブジェクトキーのプレフィックス
const KEY_PREFIX: &str = "objects/";

/// S3上に保存するエンベロープ。
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    metadata: ObjectMetadata,
    /// 失効時刻（UNIXエポックからのミリ秒）
    expires_at_ms: u64,
    #[serde(with = "serde_bytes")]
    content: Vec<u8>,
}

impl Envelope {
    fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at_ms
    }
}

fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(envelope)
        .map_err(|e| StoreError::Corrupt(format!("エンベロープのシリアライズに失敗: {e}")))
}

fn decode_envelope(bytes: &[u8]) -> Result<Envelope, StoreError> {
    bincode::deserialize(bytes)
        .map_err(|e| StoreError::Corrupt(format!("エンベロープのデコードに失敗: {e}")))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// `now_ms` からTTL後の失効時刻。u64に収まらない場合は飽和させる
fn expiry_ms(now_ms: u64, ttl: Duration) -> u64 {
    now_ms.saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
}

fn object_key(id: &ObjectId) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// S3互換ストレージによるオブジェクトストア実装。
pub struct S3ObjectStore {
    bucket: s3::Bucket,
}

impl S3ObjectStore {
    /// S3互換バケットからストアを構築する。
    pub fn new(bucket: s3::Bucket) -> Self {
        Self { bucket }
    }

    /// S3互換バケットを初期化する。
    fn init_bucket(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        bucket_name: &str,
    ) -> anyhow::Result<s3::Bucket> {
        // AWS S3エンドポイント（s3.REGION.amazonaws.com）からリージョンを自動検出。
        // 非AWSエンドポイントではus-east-1をフォールバックとして使用。
        let detected_region = std::env::var("S3_REGION").ok().unwrap_or_else(|| {
            endpoint
                .find("s3.")
                .and_then(|start| {
                    let rest = &endpoint[start + 3..];
                    rest.find(".amazonaws.com").map(|end| rest[..end].to_string())
                })
                .unwrap_or_else(|| "us-east-1".to_string())
        });
        let region = s3::Region::Custom {
            region: detected_region,
            endpoint: endpoint.to_string(),
        };

        let credentials = s3::creds::Credentials::new(
            Some(access_key),
            Some(secret_key),
            None,
            None,
            None,
        )?;

        let bucket = s3::Bucket::new(bucket_name, region, credentials)?.with_path_style();

        Ok(*bucket)
    }

    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint = std::env::var("S3_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:9000".to_string());
        let access_key =
            std::env::var("S3_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let secret_key =
            std::env::var("S3_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let bucket_name =
            std::env::var("S3_BUCKET").unwrap_or_else(|_| "tempdrop-objects".to_string());

        tracing::info!(s3_endpoint = %endpoint, s3_bucket = %bucket_name, "S3ストアを設定");

        let bucket = Self::init_bucket(&endpoint, &access_key, &secret_key, &bucket_name)?;
        Ok(Self::new(bucket))
    }

    /// 失効済みオブジェクトの削除を試みる。失敗しても読み取り結果には影響しない。
    async fn discard_expired(&self, key: &str) {
        if let Err(e) = self.bucket.delete_object(key).await {
            tracing::debug!(key, error = %e, "失効オブジェクトの削除に失敗");
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, record: ObjectRecord, ttl: Duration) -> Result<(), StoreError> {
        let key = object_key(&record.id);
        let envelope = Envelope {
            metadata: record.metadata,
            expires_at_ms: expiry_ms(now_ms(), ttl),
            content: record.content,
        };
        let bytes = encode_envelope(&envelope)?;

        let response = self
            .bucket
            .put_object_with_content_type(&key, &bytes, "application/octet-stream")
            .await
            .map_err(|e| StoreError::Unavailable(format!("PUT {key} 失敗: {e}")))?;

        match response.status_code() {
            200..=299 => Ok(()),
            code => Err(StoreError::Unavailable(format!("PUT {key}: HTTP {code}"))),
        }
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<ObjectRecord>, StoreError> {
        let key = object_key(id);

        let response = match self.bucket.get_object(&key).await {
            Ok(response) => response,
            Err(S3Error::HttpFailWithBody(404, _)) => return Ok(None),
            Err(e) => return Err(StoreError::Unavailable(format!("GET {key} 失敗: {e}"))),
        };

        match response.status_code() {
            200..=299 => {}
            404 => return Ok(None),
            code => return Err(StoreError::Unavailable(format!("GET {key}: HTTP {code}"))),
        }

        let envelope = decode_envelope(response.bytes())?;
        if envelope.is_expired(now_ms()) {
            self.discard_expired(&key).await;
            return Ok(None);
        }

        Ok(Some(ObjectRecord {
            id: id.clone(),
            content: envelope.content,
            metadata: envelope.metadata,
        }))
    }
}
