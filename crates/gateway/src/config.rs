//! # Gateway設定・共有状態
//!
//! TTLなどの設定値は定数ではなく `GatewayConfig` として構築時に渡す。
//! 共有状態はリクエスト間で変更されない（可変状態はストア側にのみ存在する）。

use std::time::Duration;

use crate::storage::ObjectStore;

/// 既定のTTL（60秒）
pub const DEFAULT_OBJECT_TTL: Duration = Duration::from_secs(60);
/// 既定のストア操作上限時間
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);
/// TTLの上限（365日）。これを超える設定値はこの値に丸める
pub const MAX_OBJECT_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);
/// 既定のアップロード上限（25MiB）
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Gatewayの設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 全オブジェクトに一律で適用するTTL。クライアントからは変更できない
    pub object_ttl: Duration,
    /// ストア操作1回あたりの上限時間。超過は StoreUnavailable
    pub store_timeout: Duration,
    /// リクエストボディの上限（バイト）。トランスポート層で適用する
    pub max_upload_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            object_ttl: DEFAULT_OBJECT_TTL,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// オブジェクトストア（インメモリ、S3互換等、トレイトで抽象化）
    pub store: Box<dyn ObjectStore>,
    /// オブジェクトのTTL（`MAX_OBJECT_TTL` で丸め済み）
    pub object_ttl: Duration,
    /// ストア操作の上限時間
    pub store_timeout: Duration,
    /// アップロード最大サイズ（バイト）
    pub max_upload_bytes: usize,
}

impl GatewayState {
    pub fn new(config: &GatewayConfig, store: Box<dyn ObjectStore>) -> Self {
        Self {
            store,
            object_ttl: config.object_ttl.min(MAX_OBJECT_TTL),
            store_timeout: config.store_timeout,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}
