#![allow(dead_code)]

pub mod mocks;

use mocks::RecordingRemoteApi;
use pos_sync::application::ports::RemoteApi;
use pos_sync::infrastructure::database::ConnectionPool;
use pos_sync::shared::AppConfig;
use pos_sync::AppState;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const TEST_TOKEN: &str = "test-token";

pub struct TestContext {
    pub state: AppState,
    pub api: Arc<RecordingRemoteApi>,
}

/// Fully wired engine over an in-memory queue and a recording remote API.
pub async fn setup() -> TestContext {
    let pool = ConnectionPool::from_memory().await.expect("in-memory sqlite");
    setup_with_pool(pool).await
}

pub async fn setup_with_pool(pool: ConnectionPool) -> TestContext {
    let api = Arc::new(RecordingRemoteApi::new());
    let remote: Arc<dyn RemoteApi> = api.clone();
    let state = AppState::with_components(AppConfig::default(), pool, remote)
        .await
        .expect("app state");
    TestContext { state, api }
}

impl TestContext {
    pub async fn sign_in(&self) {
        self.state
            .credentials
            .set_token(TEST_TOKEN.to_string())
            .await;
    }

    pub fn go_offline(&self) {
        self.state.network.set_reachable(false);
    }

    pub fn go_online(&self) {
        self.state.network.set_reachable(true);
    }
}

/// Polls `check` until it returns true or `timeout` elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check().await
}
