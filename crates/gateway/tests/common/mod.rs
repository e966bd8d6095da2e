use std::net::SocketAddr;
use std::sync::Arc;

use tempdrop_gateway::storage::MemoryObjectStore;
use tempdrop_gateway::{router, GatewayConfig, GatewayState};
use tokio::net::TcpListener;

pub struct TestServer {
    pub url: String,
    #[allow(dead_code)]
    pub addr: SocketAddr,
    #[allow(dead_code)]
    pub store: MemoryObjectStore,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(GatewayConfig::default()).await
    }

    pub async fn start_with(config: GatewayConfig) -> Self {
        let store = MemoryObjectStore::new();
        let state = Arc::new(GatewayState::new(&config, Box::new(store.clone())));
        let app = router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        Self {
            url: format!("http://{addr}"),
            addr,
            store,
        }
    }

    pub fn object_url(&self) -> String {
        format!("{}/upload", self.url)
    }
}
