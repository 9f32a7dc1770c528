use super::dispatch::{CommandDispatcher, DispatchOutcome};
use crate::application::ports::{
    CommandQueueStore, CredentialSource, DeliveryContext, NetworkStatus,
};
use crate::domain::entities::offline::{
    ActionOutcome, Command, OptimisticRecord, QueuedCommandDraft,
};
use crate::domain::value_objects::{
    CommandPayload, CommandType, IdempotencyKey, PlaceholderId, SubmitClock,
};
use crate::shared::error::AppError;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// Why an action skipped the direct call.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OfflineReason {
    Unreachable,
    PlaceholderTarget(String),
    NoCredential,
    DirectFailed(String),
}

impl OfflineReason {
    fn describe(&self) -> String {
        match self {
            OfflineReason::Unreachable => "network unreachable".to_string(),
            OfflineReason::PlaceholderTarget(id) => format!("parent {id} not yet synced"),
            OfflineReason::NoCredential => "no session credential".to_string(),
            OfflineReason::DirectFailed(err) => format!("direct call failed: {err}"),
        }
    }
}

/// Single entry point for state-changing actions.
///
/// Tries the server first when it is believed reachable and falls back to the durable
/// queue otherwise, handing back an optimistic record the caller can render immediately.
pub struct OptimisticMutator {
    store: Arc<dyn CommandQueueStore>,
    dispatcher: CommandDispatcher,
    network: Arc<dyn NetworkStatus>,
    credentials: Arc<dyn CredentialSource>,
    clock: SubmitClock,
}

impl OptimisticMutator {
    pub fn new(
        store: Arc<dyn CommandQueueStore>,
        dispatcher: CommandDispatcher,
        network: Arc<dyn NetworkStatus>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            network,
            credentials,
            clock: SubmitClock::new(),
        }
    }

    pub async fn perform(&self, command: Command) -> Result<ActionOutcome, AppError> {
        let command_type = command.command_type();
        if !command.is_recognized() {
            return Err(AppError::ValidationError(format!(
                "Cannot perform unrecognized command {command_type}"
            )));
        }

        let payload = command.to_payload().map_err(AppError::ValidationError)?;
        let submitted_at = self.clock.next(Utc::now());
        let key = IdempotencyKey::mint(&command_type, &payload, submitted_at);

        let reason = match self.try_direct(&command, &key).await {
            Ok(response) => {
                tracing::debug!(
                    target: "offline::mutator",
                    command_type = %command_type,
                    key = %key,
                    "action delivered online"
                );
                return Ok(ActionOutcome::online(response));
            }
            Err(reason) => reason,
        };

        self.capture(&command, command_type, payload, key, reason)
            .await
    }

    pub async fn create_order(&self, order: Value) -> Result<ActionOutcome, AppError> {
        self.perform(Command::CreateOrder { order }).await
    }

    pub async fn add_order_item(
        &self,
        order_id: impl Into<String>,
        item: Value,
    ) -> Result<ActionOutcome, AppError> {
        self.perform(Command::AddOrderItem {
            order_id: order_id.into(),
            item,
        })
        .await
    }

    pub async fn send_order(&self, order_id: impl Into<String>) -> Result<ActionOutcome, AppError> {
        self.perform(Command::SendOrder {
            order_id: order_id.into(),
        })
        .await
    }

    pub async fn bump_ticket(
        &self,
        station_id: impl Into<String>,
        ticket_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Result<ActionOutcome, AppError> {
        self.perform(Command::KdsBump {
            station_id: station_id.into(),
            ticket_id: ticket_id.into(),
            status: status.into(),
        })
        .await
    }

    pub async fn record_payment(
        &self,
        order_id: impl Into<String>,
        payment: Value,
    ) -> Result<ActionOutcome, AppError> {
        self.perform(Command::ProcessPayment {
            order_id: order_id.into(),
            payment,
        })
        .await
    }

    pub async fn adjust_inventory(&self, adjustment: Value) -> Result<ActionOutcome, AppError> {
        self.perform(Command::InventoryAdjustment { adjustment })
            .await
    }

    async fn try_direct(
        &self,
        command: &Command,
        key: &IdempotencyKey,
    ) -> Result<Value, OfflineReason> {
        if !self.network.is_reachable() {
            return Err(OfflineReason::Unreachable);
        }
        if command.targets_placeholder() {
            let parent = command.parent_id().unwrap_or_default().to_string();
            return Err(OfflineReason::PlaceholderTarget(parent));
        }
        let Some(token) = self.credentials.bearer_token().await else {
            return Err(OfflineReason::NoCredential);
        };

        let ctx = DeliveryContext::direct(token, key.clone());
        match self.dispatcher.dispatch(command, &ctx).await {
            Ok(DispatchOutcome::Delivered(response)) => Ok(response),
            Ok(DispatchOutcome::Unsupported(reason)) => Err(OfflineReason::DirectFailed(reason)),
            Err(err) => {
                if err.is_transient() {
                    tracing::debug!(
                        target: "offline::mutator",
                        key = %key,
                        error = %err,
                        "direct call failed; falling back to queue"
                    );
                } else {
                    tracing::warn!(
                        target: "offline::mutator",
                        key = %key,
                        error = %err,
                        "direct call refused; queued for replay"
                    );
                }
                Err(OfflineReason::DirectFailed(err.to_string()))
            }
        }
    }

    async fn capture(
        &self,
        command: &Command,
        command_type: CommandType,
        payload: CommandPayload,
        key: IdempotencyKey,
        reason: OfflineReason,
    ) -> Result<ActionOutcome, AppError> {
        let placeholder = PlaceholderId::generate();
        let persisted_placeholder = command.creates_entity().then(|| placeholder.clone());
        let attributes = payload.as_json().clone();

        let draft =
            QueuedCommandDraft::new(command_type.clone(), payload, key.clone(), persisted_placeholder);
        let command_id = self.store.enqueue(draft).await.map_err(|err| {
            tracing::error!(
                target: "offline::mutator",
                command_type = %command_type,
                error = %err,
                "failed to queue offline action"
            );
            err
        })?;

        tracing::info!(
            target: "offline::mutator",
            command_id = %command_id,
            command_type = %command_type,
            key = %key,
            placeholder = %placeholder,
            reason = %reason.describe(),
            "action queued for replay"
        );

        let record = OptimisticRecord::new(placeholder, command_type, attributes);
        Ok(ActionOutcome::offline(command_id, record))
    }
}
