use super::rows::{FailedCommandRow, QueuedCommandRow};
use crate::domain::entities::offline::{FailedCommand, QueuedCommand};
use crate::domain::value_objects::{
    CommandId, CommandPayload, CommandType, IdempotencyKey, PlaceholderId,
};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};

pub fn queued_command_from_row(row: QueuedCommandRow) -> Result<QueuedCommand, AppError> {
    Ok(QueuedCommand {
        id: command_id_from_i64(row.id)?,
        command_type: CommandType::from(row.command_type.as_str()),
        payload: payload_from_json(&row.payload)?,
        payload_version: non_negative_u32(row.payload_version, "payload_version")?,
        idempotency_key: IdempotencyKey::new(row.idempotency_key)
            .map_err(AppError::DeserializationError)?,
        placeholder_id: row
            .placeholder_id
            .map(PlaceholderId::new)
            .transpose()
            .map_err(AppError::DeserializationError)?,
        created_at: timestamp_from_millis(row.created_at)?,
        retry_count: non_negative_u32(row.retry_count, "retry_count")?,
        last_error: row.last_error,
    })
}

pub fn failed_command_from_row(row: FailedCommandRow) -> Result<FailedCommand, AppError> {
    Ok(FailedCommand {
        id: row.id,
        command_id: command_id_from_i64(row.command_id)?,
        command_type: CommandType::from(row.command_type.as_str()),
        payload: payload_from_json(&row.payload)?,
        idempotency_key: IdempotencyKey::new(row.idempotency_key)
            .map_err(AppError::DeserializationError)?,
        retry_count: non_negative_u32(row.retry_count, "retry_count")?,
        reason: row.reason,
        created_at: timestamp_from_millis(row.created_at)?,
        failed_at: timestamp_from_millis(row.failed_at)?,
    })
}

pub fn command_id_from_i64(value: i64) -> Result<CommandId, AppError> {
    CommandId::new(value).map_err(AppError::DeserializationError)
}

pub fn payload_to_json(payload: &CommandPayload) -> Result<String, AppError> {
    serde_json::to_string(payload.as_json())
        .map_err(|err| AppError::SerializationError(err.to_string()))
}

fn payload_from_json(raw: &str) -> Result<CommandPayload, AppError> {
    CommandPayload::from_json_str(raw).map_err(AppError::DeserializationError)
}

fn timestamp_from_millis(value: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp_millis(value)
        .ok_or_else(|| AppError::DeserializationError(format!("Invalid timestamp: {value}")))
}

fn non_negative_u32(value: i64, field: &str) -> Result<u32, AppError> {
    u32::try_from(value)
        .map_err(|_| AppError::DeserializationError(format!("Invalid {field}: {value}")))
}
