use crate::application::ports::{CommandQueueStore, CredentialSource, NetworkStatus, RemoteApi};
use crate::application::services::{
    CommandDispatcher, OptimisticMutator, ReplayEngine, SchedulerHandle, TriggerScheduler,
};
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::http::HttpRemoteApi;
use crate::infrastructure::network::ChannelNetworkStatus;
use crate::infrastructure::offline::SqliteCommandQueue;
use crate::infrastructure::session::SessionCredentials;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;

/// Wires the queue, remote API and sync engine from one configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db_pool: ConnectionPool,
    pub queue: Arc<SqliteCommandQueue>,
    pub network: Arc<ChannelNetworkStatus>,
    pub credentials: Arc<SessionCredentials>,
    pub mutator: Arc<OptimisticMutator>,
    pub replay_engine: Arc<ReplayEngine>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let db_pool = ConnectionPool::new(&config.database).await?;
        let api: Arc<dyn RemoteApi> = Arc::new(HttpRemoteApi::new(&config.api)?);
        Self::with_components(config, db_pool, api).await
    }

    /// Same wiring with a caller-supplied pool and remote API.
    pub async fn with_components(
        config: AppConfig,
        db_pool: ConnectionPool,
        api: Arc<dyn RemoteApi>,
    ) -> Result<Self, AppError> {
        let queue = Arc::new(SqliteCommandQueue::new(db_pool.get_pool().clone()));
        queue.open().await?;

        let network = Arc::new(ChannelNetworkStatus::default());
        let credentials = Arc::new(SessionCredentials::default());
        let dispatcher = CommandDispatcher::new(api);

        let store: Arc<dyn CommandQueueStore> = queue.clone();
        let network_status: Arc<dyn NetworkStatus> = network.clone();
        let credential_source: Arc<dyn CredentialSource> = credentials.clone();

        let mutator = Arc::new(OptimisticMutator::new(
            Arc::clone(&store),
            dispatcher.clone(),
            network_status,
            Arc::clone(&credential_source),
        ));
        let replay_engine = Arc::new(
            ReplayEngine::new(store, dispatcher, credential_source)
                .with_max_retries(config.sync.max_retries),
        );

        tracing::info!(
            target: "offline::queue",
            api = %config.api.base_url,
            max_retries = config.sync.max_retries,
            "sync engine ready"
        );

        Ok(Self {
            config,
            db_pool,
            queue,
            network,
            credentials,
            mutator,
            replay_engine,
        })
    }

    pub fn start_scheduler(&self) -> SchedulerHandle {
        let network: Arc<dyn NetworkStatus> = self.network.clone();
        TriggerScheduler::new(Arc::clone(&self.replay_engine), network)
            .with_interval(Duration::from_secs(self.config.sync.interval_secs))
            .with_timer(self.config.sync.auto_sync)
            .start()
    }
}
