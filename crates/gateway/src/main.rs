//! # tempdrop Gateway エントリポイント
//!
//! コマンドライン引数（未指定時は環境変数）から設定を読み込み、
//! ストアを選択してHTTPサーバーを起動する。

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tempdrop_gateway::storage::{MemoryObjectStore, ObjectStore};
use tempdrop_gateway::{router, GatewayConfig, GatewayState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ストアのバックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StorageBackend {
    /// プロセス内メモリ（開発環境用）
    Memory,
    /// S3互換ストレージ
    S3,
}

#[derive(Debug, Parser)]
#[command(name = "tempdrop-gateway", version, about = "Ephemeral anonymous object store")]
struct Args {
    /// 待ち受けアドレス
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    listen: String,

    /// オブジェクトのTTL（秒）
    #[arg(long, env = "OBJECT_TTL_SECS", default_value_t = 60)]
    object_ttl_secs: u64,

    /// ストア操作1回あたりの上限時間（ミリ秒）
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = 5000)]
    store_timeout_ms: u64,

    /// アップロード最大サイズ（バイト）
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = tempdrop_gateway::config::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// ストアのバックエンド
    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value_t = StorageBackend::Memory)]
    storage: StorageBackend,

    /// インメモリストアの失効エントリ掃除間隔（秒）
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 30)]
    sweep_interval_secs: u64,
}

impl Args {
    fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            object_ttl: Duration::from_secs(self.object_ttl_secs),
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// 選択されたバックエンドのストアを構築する。
fn build_store(args: &Args) -> anyhow::Result<Box<dyn ObjectStore>> {
    match args.storage {
        StorageBackend::Memory => {
            tracing::warn!("インメモリストアで起動します（開発環境用、再起動でデータは失われます）");
            let store = MemoryObjectStore::new();
            let _sweeper = store.spawn_sweeper(Duration::from_secs(args.sweep_interval_secs.max(1)));
            Ok(Box::new(store))
        }
        #[cfg(feature = "vendor-aws")]
        StorageBackend::S3 => {
            let store = tempdrop_gateway::storage::S3ObjectStore::from_env()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "vendor-aws"))]
        StorageBackend::S3 => {
            anyhow::bail!("S3バックエンドは vendor-aws フィーチャー無効のため利用できません")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tempdrop_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.gateway_config();
    let store = build_store(&args)?;

    tracing::info!(
        object_ttl_secs = config.object_ttl.as_secs(),
        store_timeout_ms = config.store_timeout.as_millis() as u64,
        max_upload_bytes = config.max_upload_bytes,
        storage = ?args.storage,
        "Gateway設定"
    );

    let state = Arc::new(GatewayState::new(&config, store));
    let app = router(state);

    tracing::info!("Gatewayを {} で起動します", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
