pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::services::{
    CommandDispatcher, OptimisticMutator, ReplayEngine, SchedulerHandle, TriggerScheduler,
};
pub use domain::entities::offline::{ActionOutcome, Command, DrainOutcome, DrainReport, DrainTrigger};
pub use infrastructure::database::ConnectionPool;
pub use shared::{AppConfig, AppError};
pub use state::AppState;

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pos_sync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
