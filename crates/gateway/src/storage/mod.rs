//! # オブジェクトストア
//!
//! 外部のキーバリュー媒体を `put` / `get` の契約で抽象化する。
//!
//! ## バックエンド
//! - `MemoryObjectStore`: プロセス内のTTL付きマップ（開発・テスト用）
//! - `S3ObjectStore`: S3互換ストレージ（AWS S3, MinIO, Cloudflare R2等）
//!
//! 同一IDへの単一のput/getの原子性とTTL失効はバックエンドが保証する。
//! Gateway側はロックを持たない。

pub mod memory;
#[cfg(feature = "vendor-aws")]
pub mod s3;

pub use memory::MemoryObjectStore;
#[cfg(feature = "vendor-aws")]
pub use s3::S3ObjectStore;

use std::future::Future;
use std::time::Duration;

use tempdrop_types::{ObjectId, ObjectRecord};

/// ストア操作のエラー。
///
/// 「存在しない」はエラーではなく `Ok(None)` で表す。
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 媒体に到達できない、またはタイムアウト
    #[error("ストレージに到達できません: {0}")]
    Unavailable(String),
    /// 保存済みデータを復元できない
    #[error("保存データが破損しています: {0}")]
    Corrupt(String),
}

/// オブジェクトストアの抽象インターフェース。
///
/// 運用者はバックエンドを選択できる。どの実装も部分的な書き込みを
/// 観測させてはならない（getは完全なレコードか `None` のみを返す）。
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// レコードを保存し、`ttl` 経過まで取得可能にする。
    ///
    /// 既存IDへの書き込みは置き換えとして扱う（エラーにしない）。
    async fn put(&self, record: ObjectRecord, ttl: Duration) -> Result<(), StoreError>;

    /// レコードを取得する。未作成・失効済みはいずれも `Ok(None)`。
    async fn get(&self, id: &ObjectId) -> Result<Option<ObjectRecord>, StoreError>;
}

/// ストア操作に上限時間を設ける。超過は `StoreError::Unavailable` として扱い、再試行しない。
pub async fn bounded<T, F>(limit: Duration, op: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, op).await.map_err(|_| {
        StoreError::Unavailable(format!(
            "ストア操作が {}ms 以内に完了しませんでした",
            limit.as_millis()
        ))
    })?
}
