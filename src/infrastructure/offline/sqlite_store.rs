use super::mappers::{
    command_id_from_i64, failed_command_from_row, payload_to_json, queued_command_from_row,
};
use super::rows::{FailedCommandRow, QueuedCommandRow};
use crate::application::ports::command_queue::CommandQueueStore;
use crate::domain::entities::offline::{FailedCommand, QueuedCommand, QueuedCommandDraft};
use crate::domain::value_objects::{CommandId, PlaceholderResolution};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tokio::sync::OnceCell;

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS queued_commands (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        command_type TEXT NOT NULL,
        payload TEXT NOT NULL,
        payload_version INTEGER NOT NULL DEFAULT 1,
        idempotency_key TEXT NOT NULL UNIQUE,
        placeholder_id TEXT,
        created_at INTEGER NOT NULL,
        retry_count INTEGER NOT NULL DEFAULT 0,
        last_error TEXT
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_queued_commands_fifo
        ON queued_commands (created_at, id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS failed_commands (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        command_id INTEGER NOT NULL,
        command_type TEXT NOT NULL,
        payload TEXT NOT NULL,
        idempotency_key TEXT NOT NULL,
        retry_count INTEGER NOT NULL,
        reason TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        failed_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS placeholder_ids (
        placeholder_id TEXT PRIMARY KEY,
        server_id TEXT,
        resolved_at INTEGER NOT NULL
    )
    "#,
];

pub struct SqliteCommandQueue {
    pool: Pool<Sqlite>,
    schema: OnceCell<()>,
}

impl SqliteCommandQueue {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            schema: OnceCell::new(),
        }
    }

    async fn ensure_schema(&self) -> Result<(), AppError> {
        self.schema
            .get_or_try_init(|| async {
                for statement in SCHEMA {
                    sqlx::query(statement).execute(&self.pool).await?;
                }
                tracing::debug!(target: "offline::queue", "command queue schema ready");
                Ok::<(), AppError>(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CommandQueueStore for SqliteCommandQueue {
    async fn open(&self) -> Result<(), AppError> {
        self.ensure_schema().await
    }

    async fn enqueue(&self, draft: QueuedCommandDraft) -> Result<CommandId, AppError> {
        self.ensure_schema().await?;
        let payload = payload_to_json(&draft.payload)?;
        let created_at = Utc::now().timestamp_millis();

        let result = sqlx::query(
            r#"
            INSERT INTO queued_commands (
                command_type, payload, payload_version, idempotency_key,
                placeholder_id, created_at, retry_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
            ON CONFLICT(idempotency_key) DO NOTHING
            "#,
        )
        .bind(draft.command_type.as_str())
        .bind(&payload)
        .bind(i64::from(draft.payload_version))
        .bind(draft.idempotency_key.as_str())
        .bind(draft.placeholder_id.as_ref().map(|id| id.as_str()))
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let (existing,): (i64,) =
                sqlx::query_as("SELECT id FROM queued_commands WHERE idempotency_key = ?1")
                    .bind(draft.idempotency_key.as_str())
                    .fetch_one(&self.pool)
                    .await?;
            tracing::debug!(
                target: "offline::queue",
                id = existing,
                key = %draft.idempotency_key,
                "command already queued"
            );
            return command_id_from_i64(existing);
        }

        let id = result.last_insert_rowid();
        tracing::debug!(
            target: "offline::queue",
            id,
            command_type = %draft.command_type,
            key = %draft.idempotency_key,
            "command enqueued"
        );
        command_id_from_i64(id)
    }

    async fn list_all(&self) -> Result<Vec<QueuedCommand>, AppError> {
        self.ensure_schema().await?;
        let rows = sqlx::query_as::<_, QueuedCommandRow>(
            r#"
            SELECT id, command_type, payload, payload_version, idempotency_key,
                   placeholder_id, created_at, retry_count, last_error
            FROM queued_commands
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut commands = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match queued_command_from_row(row) {
                Ok(command) => commands.push(command),
                Err(err) => tracing::warn!(
                    target: "offline::queue",
                    id,
                    error = %err,
                    "skipping unreadable queued command"
                ),
            }
        }
        Ok(commands)
    }

    async fn remove(&self, id: CommandId) -> Result<(), AppError> {
        self.ensure_schema().await?;
        sqlx::query("DELETE FROM queued_commands WHERE id = ?1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        self.ensure_schema().await?;
        let result = sqlx::query("DELETE FROM queued_commands")
            .execute(&self.pool)
            .await?;
        tracing::info!(
            target: "offline::queue",
            removed = result.rows_affected(),
            "command queue cleared"
        );
        Ok(())
    }

    async fn record_failure(&self, id: CommandId, error: &str) -> Result<Option<u32>, AppError> {
        self.ensure_schema().await?;
        let retry_count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE queued_commands
            SET retry_count = retry_count + 1, last_error = ?1
            WHERE id = ?2
            RETURNING retry_count
            "#,
        )
        .bind(error)
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        retry_count
            .map(|value| {
                u32::try_from(value).map_err(|_| {
                    AppError::DeserializationError(format!("Invalid retry_count: {value}"))
                })
            })
            .transpose()
    }

    async fn retire(&self, command: &QueuedCommand, reason: &str) -> Result<(), AppError> {
        self.ensure_schema().await?;
        let payload = payload_to_json(&command.payload)?;
        let failed_at = Utc::now().timestamp_millis();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO failed_commands (
                command_id, command_type, payload, idempotency_key,
                retry_count, reason, created_at, failed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(command.id.value())
        .bind(command.command_type.as_str())
        .bind(&payload)
        .bind(command.idempotency_key.as_str())
        .bind(i64::from(command.retry_count))
        .bind(reason)
        .bind(command.created_at.timestamp_millis())
        .bind(failed_at)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM queued_commands WHERE id = ?1")
            .bind(command.id.value())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_failed(&self) -> Result<Vec<FailedCommand>, AppError> {
        self.ensure_schema().await?;
        let rows = sqlx::query_as::<_, FailedCommandRow>(
            r#"
            SELECT id, command_id, command_type, payload, idempotency_key,
                   retry_count, reason, created_at, failed_at
            FROM failed_commands
            ORDER BY failed_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(failed_command_from_row).collect()
    }

    async fn record_placeholder(
        &self,
        placeholder_id: &str,
        server_id: Option<&str>,
    ) -> Result<(), AppError> {
        self.ensure_schema().await?;
        sqlx::query(
            r#"
            INSERT INTO placeholder_ids (placeholder_id, server_id, resolved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(placeholder_id) DO UPDATE SET
                server_id = excluded.server_id,
                resolved_at = excluded.resolved_at
            "#,
        )
        .bind(placeholder_id)
        .bind(server_id)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn resolve_placeholder(
        &self,
        placeholder_id: &str,
    ) -> Result<Option<PlaceholderResolution>, AppError> {
        self.ensure_schema().await?;
        let server_id: Option<Option<String>> =
            sqlx::query_scalar("SELECT server_id FROM placeholder_ids WHERE placeholder_id = ?1")
                .bind(placeholder_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(server_id.map(PlaceholderResolution::from_server_id))
    }
}
