use crate::domain::value_objects::IdempotencyKey;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Per-call delivery metadata attached to every outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryContext {
    pub bearer_token: String,
    pub idempotency_key: IdempotencyKey,
    /// `true` for deliveries made by the replay engine.
    pub replay: bool,
}

impl DeliveryContext {
    pub fn direct(bearer_token: String, idempotency_key: IdempotencyKey) -> Self {
        Self {
            bearer_token,
            idempotency_key,
            replay: false,
        }
    }

    pub fn replay(bearer_token: String, idempotency_key: IdempotencyKey) -> Self {
        Self {
            bearer_token,
            idempotency_key,
            replay: true,
        }
    }
}

/// Remote order, payment, ticket and inventory endpoints.
///
/// Implementations return the server's authoritative record on success and classify
/// failures as `Network`, `Timeout`, `Unauthenticated` or `ServerRejected`.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn create_order(&self, order: &Value, ctx: &DeliveryContext) -> Result<Value, AppError>;
    async fn add_order_item(
        &self,
        order_id: &str,
        item: &Value,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError>;
    async fn send_order(&self, order_id: &str, ctx: &DeliveryContext) -> Result<Value, AppError>;
    async fn bump_ticket(
        &self,
        station_id: &str,
        ticket_id: &str,
        status: &str,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError>;
    async fn process_payment(
        &self,
        order_id: &str,
        payment: &Value,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError>;
    async fn adjust_inventory(
        &self,
        adjustment: &Value,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError>;
}
