use super::Command;
use crate::domain::value_objects::{
    CURRENT_PAYLOAD_VERSION, CommandId, CommandPayload, CommandType, IdempotencyKey,
    PlaceholderId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of one unconfirmed state change. Present in the store means pending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedCommand {
    pub id: CommandId,
    pub command_type: CommandType,
    pub payload: CommandPayload,
    pub payload_version: u32,
    pub idempotency_key: IdempotencyKey,
    pub placeholder_id: Option<PlaceholderId>,
    pub created_at: DateTime<Utc>,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

impl QueuedCommand {
    pub fn command(&self) -> Command {
        Command::decode(&self.command_type, &self.payload, self.payload_version)
    }
}

/// Everything the store needs to insert a new command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedCommandDraft {
    pub command_type: CommandType,
    pub payload: CommandPayload,
    pub payload_version: u32,
    pub idempotency_key: IdempotencyKey,
    pub placeholder_id: Option<PlaceholderId>,
}

impl QueuedCommandDraft {
    pub fn new(
        command_type: CommandType,
        payload: CommandPayload,
        idempotency_key: IdempotencyKey,
        placeholder_id: Option<PlaceholderId>,
    ) -> Self {
        Self {
            command_type,
            payload,
            payload_version: CURRENT_PAYLOAD_VERSION,
            idempotency_key,
            placeholder_id,
        }
    }
}

/// A command retired after exhausting its retries or losing its parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedCommand {
    pub id: i64,
    pub command_id: CommandId,
    pub command_type: CommandType,
    pub payload: CommandPayload,
    pub idempotency_key: IdempotencyKey,
    pub retry_count: u32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub failed_at: DateTime<Utc>,
}
