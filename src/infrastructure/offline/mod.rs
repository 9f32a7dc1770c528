pub mod mappers;
pub mod metrics;
pub mod rows;
pub mod sqlite_store;

pub use metrics::{ReplayMetrics, ReplayMetricsSnapshot};
pub use sqlite_store::SqliteCommandQueue;
