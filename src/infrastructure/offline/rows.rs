use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueuedCommandRow {
    pub id: i64,
    pub command_type: String,
    pub payload: String,
    pub payload_version: i64,
    pub idempotency_key: String,
    pub placeholder_id: Option<String>,
    pub created_at: i64,
    pub retry_count: i64,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FailedCommandRow {
    pub id: i64,
    pub command_id: i64,
    pub command_type: String,
    pub payload: String,
    pub idempotency_key: String,
    pub retry_count: i64,
    pub reason: String,
    pub created_at: i64,
    pub failed_at: i64,
}
