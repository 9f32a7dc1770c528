use crate::application::ports::remote_api::{DeliveryContext, RemoteApi};
use crate::domain::entities::offline::Command;
use crate::shared::error::AppError;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The server accepted the command and returned its record.
    Delivered(Value),
    /// No outbound call exists for this command; nothing was sent.
    Unsupported(String),
}

/// Routes each command kind to its remote call.
#[derive(Clone)]
pub struct CommandDispatcher {
    api: Arc<dyn RemoteApi>,
}

impl CommandDispatcher {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self { api }
    }

    pub async fn dispatch(
        &self,
        command: &Command,
        ctx: &DeliveryContext,
    ) -> Result<DispatchOutcome, AppError> {
        let response = match command {
            Command::CreateOrder { order } => self.api.create_order(order, ctx).await?,
            Command::AddOrderItem { order_id, item } => {
                self.api.add_order_item(order_id, item, ctx).await?
            }
            Command::SendOrder { order_id } => self.api.send_order(order_id, ctx).await?,
            Command::KdsBump {
                station_id,
                ticket_id,
                status,
            } => {
                self.api
                    .bump_ticket(station_id, ticket_id, status, ctx)
                    .await?
            }
            Command::ProcessPayment { order_id, payment } => {
                self.api.process_payment(order_id, payment, ctx).await?
            }
            Command::InventoryAdjustment { adjustment } => {
                self.api.adjust_inventory(adjustment, ctx).await?
            }
            Command::Unrecognized {
                command_type,
                reason,
                ..
            } => {
                tracing::warn!(
                    target: "offline::dispatch",
                    command_type = %command_type,
                    reason = %reason,
                    "no handler for command"
                );
                return Ok(DispatchOutcome::Unsupported(reason.clone()));
            }
        };
        Ok(DispatchOutcome::Delivered(response))
    }
}

/// Server-assigned id of a created entity: the response's `id` field, or the `id` of an
/// `order` or `data` envelope.
pub fn server_id(response: &Value) -> Option<String> {
    id_field(response)
        .or_else(|| response.get("order").and_then(id_field))
        .or_else(|| response.get("data").and_then(id_field))
}

fn id_field(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
