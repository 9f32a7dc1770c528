use super::error::DispatchError;
use crate::application::ports::remote_api::{DeliveryContext, RemoteApi};
use crate::shared::config::ApiConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::{Value, json};
use std::time::Duration;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
pub const OFFLINE_REPLAY_HEADER: &str = "X-Offline-Replay";

/// `RemoteApi` over the POS REST backend.
pub struct HttpRemoteApi {
    client: Client,
    base_url: Url,
}

impl HttpRemoteApi {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| AppError::ConfigurationError(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, DispatchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DispatchError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
        ctx: &DeliveryContext,
    ) -> Result<Value, DispatchError> {
        let url = self.endpoint(segments)?;
        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(&ctx.bearer_token)
            .header(IDEMPOTENCY_KEY_HEADER, ctx.idempotency_key.as_str());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        if ctx.replay {
            builder = builder.header(OFFLINE_REPLAY_HEADER, "true");
        }

        tracing::debug!(
            target: "offline::dispatch",
            %method,
            path = url.path(),
            key = %ctx.idempotency_key,
            replay = ctx.replay,
            "dispatching request"
        );

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        classify_response(status, &text)
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn create_order(&self, order: &Value, ctx: &DeliveryContext) -> Result<Value, AppError> {
        Ok(self.send(Method::POST, &["orders"], Some(order), ctx).await?)
    }

    async fn add_order_item(
        &self,
        order_id: &str,
        item: &Value,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError> {
        Ok(self
            .send(Method::POST, &["orders", order_id, "items"], Some(item), ctx)
            .await?)
    }

    async fn send_order(&self, order_id: &str, ctx: &DeliveryContext) -> Result<Value, AppError> {
        Ok(self
            .send(Method::POST, &["orders", order_id, "send"], None, ctx)
            .await?)
    }

    async fn bump_ticket(
        &self,
        station_id: &str,
        ticket_id: &str,
        status: &str,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError> {
        Ok(self
            .send(
                Method::PATCH,
                &["kds", "stations", station_id, "tickets", ticket_id],
                Some(&json!({ "status": status })),
                ctx,
            )
            .await?)
    }

    async fn process_payment(
        &self,
        order_id: &str,
        payment: &Value,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError> {
        Ok(self
            .send(Method::POST, &["orders", order_id, "payments"], Some(payment), ctx)
            .await?)
    }

    async fn adjust_inventory(
        &self,
        adjustment: &Value,
        ctx: &DeliveryContext,
    ) -> Result<Value, AppError> {
        Ok(self
            .send(Method::POST, &["inventory", "adjustments"], Some(adjustment), ctx)
            .await?)
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, AppError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|err| AppError::ConfigurationError(format!("Invalid API base URL: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(AppError::ConfigurationError(
            "API base URL scheme must be http or https".to_string(),
        )),
    }
}

fn classify_response(status: StatusCode, body: &str) -> Result<Value, DispatchError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(DispatchError::Unauthenticated {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(DispatchError::Rejected {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|err| DispatchError::MalformedResponse(err.to_string()))
}
