pub mod dispatch;
pub mod optimistic_mutator;
pub mod replay_service;
pub mod sync_scheduler;

pub use dispatch::{CommandDispatcher, DispatchOutcome};
pub use optimistic_mutator::OptimisticMutator;
pub use replay_service::{DEFAULT_MAX_RETRIES, ReplayEngine};
pub use sync_scheduler::{SchedulerHandle, TriggerScheduler};
