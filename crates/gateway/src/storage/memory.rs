//! # インメモリ オブジェクトストア
//!
//! プロセス内のマップにレコードを保持するバックエンド。開発環境と
//! テストで使用する。プロセス終了でデータは失われる。
//!
//! 失効は `tokio::time::Instant` で判定するため、テストでは
//! `tokio::time::pause` / `advance` で時刻を進められる。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tempdrop_types::{ObjectId, ObjectRecord};
use tokio::sync::RwLock;
use tokio::time::{Instant, MissedTickBehavior};

use super::{ObjectStore, StoreError};
use crate::config::MAX_OBJECT_TTL;

struct Entry {
    record: ObjectRecord,
    expires_at: Instant,
}

impl Entry {
    /// 失効時刻を「過ぎた」ときのみ失効扱い。
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// インメモリのTTL付きオブジェクトストア。
///
/// クローンは同じマップを共有する。
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    entries: Arc<RwLock<HashMap<ObjectId, Entry>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保持中のエントリ数（未掃除の失効エントリを含む）
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 失効済みエントリを削除し、削除した件数を返す。
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// 失効エントリを定期的に削除するバックグラウンドタスクを起動する。
    /// 媒体側のTTL退避に相当する。
    pub fn spawn_sweeper(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.sweep_expired().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "失効オブジェクトを削除しました");
                }
            }
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, record: ObjectRecord, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Instant::now() + ttl.min(MAX_OBJECT_TTL);
        let mut entries = self.entries.write().await;
        entries.insert(record.id.clone(), Entry { record, expires_at });
        Ok(())
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<ObjectRecord>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(id)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.record.clone()))
    }
}
