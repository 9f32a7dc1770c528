use crate::domain::entities::offline::{FailedCommand, QueuedCommand, QueuedCommandDraft};
use crate::domain::value_objects::{CommandId, PlaceholderResolution};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable FIFO of commands awaiting delivery.
#[async_trait]
pub trait CommandQueueStore: Send + Sync {
    /// Creates the schema on first use; safe to call repeatedly.
    async fn open(&self) -> Result<(), AppError>;
    /// Inserts a pending command. Re-enqueueing an existing idempotency key returns the
    /// id already assigned to it.
    async fn enqueue(&self, draft: QueuedCommandDraft) -> Result<CommandId, AppError>;
    /// All queued commands, oldest first.
    async fn list_all(&self) -> Result<Vec<QueuedCommand>, AppError>;
    /// Deletes a command; absent ids are not an error.
    async fn remove(&self, id: CommandId) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
    /// Bumps the retry counter and returns the new value, or `None` if the row is gone.
    async fn record_failure(&self, id: CommandId, error: &str) -> Result<Option<u32>, AppError>;
    /// Removes the command and archives it for manual follow-up.
    async fn retire(&self, command: &QueuedCommand, reason: &str) -> Result<(), AppError>;
    async fn list_failed(&self) -> Result<Vec<FailedCommand>, AppError>;
    /// Marks a placeholder's creating command as synced. `server_id` is `None` when the
    /// server acknowledged the create without naming the new record.
    async fn record_placeholder(
        &self,
        placeholder_id: &str,
        server_id: Option<&str>,
    ) -> Result<(), AppError>;
    /// `None` while the creating command has not synced.
    async fn resolve_placeholder(
        &self,
        placeholder_id: &str,
    ) -> Result<Option<PlaceholderResolution>, AppError>;
}
