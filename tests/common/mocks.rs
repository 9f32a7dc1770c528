use async_trait::async_trait;
use pos_sync::application::ports::{DeliveryContext, FailureNotifier, RemoteApi};
use pos_sync::domain::entities::offline::PermanentFailure;
use pos_sync::shared::AppError;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: &'static str,
    pub target: Option<String>,
    pub body: Value,
    pub idempotency_key: String,
    pub bearer_token: String,
    pub replay: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Network,
    Unauthorized,
    Rejected(u16),
}

impl FailureMode {
    fn into_error(self) -> AppError {
        match self {
            FailureMode::Network => AppError::Network("connection refused".into()),
            FailureMode::Unauthorized => AppError::Unauthenticated("server returned 401".into()),
            FailureMode::Rejected(status) => AppError::ServerRejected {
                status,
                message: "rejected".into(),
            },
        }
    }
}

/// Where a successful `create_order` response puts the new order's id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreatedIdShape {
    #[default]
    TopLevel,
    Nested,
    Missing,
}

type CallMatcher = Box<dyn Fn(&RecordedCall) -> bool + Send + Sync>;

/// Remote API double that records every call and fails on demand.
#[derive(Default)]
pub struct RecordingRemoteApi {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<Vec<(CallMatcher, FailureMode)>>,
    delay: Mutex<Option<Duration>>,
    next_order: Mutex<u32>,
    created_id_shape: Mutex<CreatedIdShape>,
}

impl RecordingRemoteApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self, mode: FailureMode) {
        self.fail_when(|_| true, mode);
    }

    pub fn fail_when<F>(&self, matcher: F, mode: FailureMode)
    where
        F: Fn(&RecordedCall) -> bool + Send + Sync + 'static,
    {
        self.failures.lock().unwrap().push((Box::new(matcher), mode));
    }

    pub fn recover(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn set_created_id_shape(&self, shape: CreatedIdShape) {
        *self.created_id_shape.lock().unwrap() = shape;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn handle(
        &self,
        operation: &'static str,
        target: Option<String>,
        body: Value,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let call = RecordedCall {
            operation,
            target,
            body,
            idempotency_key: ctx.idempotency_key.as_str().to_string(),
            bearer_token: ctx.bearer_token.clone(),
            replay: ctx.replay,
        };
        self.calls.lock().unwrap().push(call.clone());

        let failure = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(matcher, _)| matcher(&call))
            .map(|(_, mode)| *mode);
        if let Some(mode) = failure {
            return Err(mode.into_error());
        }

        if operation == "create_order" {
            let mut next = self.next_order.lock().unwrap();
            *next += 1;
            let id = format!("ord_{}", *next);
            return Ok(match *self.created_id_shape.lock().unwrap() {
                CreatedIdShape::TopLevel => json!({ "id": id, "order": call.body }),
                CreatedIdShape::Nested => json!({ "order": { "id": id, "table": call.body["table"] } }),
                CreatedIdShape::Missing => json!({ "ok": true }),
            });
        }
        Ok(json!({ "ok": true, "echo": call.body }))
    }
}

#[async_trait]
impl RemoteApi for RecordingRemoteApi {
    async fn create_order(&self, order: &Value, ctx: &DeliveryContext) -> Result<Value, AppError> {
        self.handle("create_order", None, order.clone(), ctx).await
    }

    async fn add_order_item(
        &self,
        order_id: &str,
        item: &Value,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError> {
        self.handle("add_order_item", Some(order_id.to_string()), item.clone(), ctx)
            .await
    }

    async fn send_order(&self, order_id: &str, ctx: &DeliveryContext) -> Result<Value, AppError> {
        self.handle("send_order", Some(order_id.to_string()), Value::Null, ctx)
            .await
    }

    async fn bump_ticket(
        &self,
        station_id: &str,
        ticket_id: &str,
        status: &str,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError> {
        self.handle(
            "bump_ticket",
            Some(format!("{station_id}/{ticket_id}")),
            json!({ "status": status }),
            ctx,
        )
        .await
    }

    async fn process_payment(
        &self,
        order_id: &str,
        payment: &Value,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError> {
        self.handle(
            "process_payment",
            Some(order_id.to_string()),
            payment.clone(),
            ctx,
        )
        .await
    }

    async fn adjust_inventory(
        &self,
        adjustment: &Value,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError> {
        self.handle("adjust_inventory", None, adjustment.clone(), ctx)
            .await
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    failures: Mutex<Vec<PermanentFailure>>,
}

impl RecordingNotifier {
    pub fn failures(&self) -> Vec<PermanentFailure> {
        self.failures.lock().unwrap().clone()
    }
}

impl FailureNotifier for RecordingNotifier {
    fn notify_permanent_failure(&self, failure: &PermanentFailure) -> Result<(), String> {
        self.failures.lock().unwrap().push(failure.clone());
        Ok(())
    }
}
