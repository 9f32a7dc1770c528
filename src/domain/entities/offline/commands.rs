use crate::domain::value_objects::{
    CURRENT_PAYLOAD_VERSION, CommandPayload, CommandType, is_placeholder,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A captured intent to mutate server-side state.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateOrder {
        order: Value,
    },
    AddOrderItem {
        order_id: String,
        item: Value,
    },
    SendOrder {
        order_id: String,
    },
    KdsBump {
        station_id: String,
        ticket_id: String,
        status: String,
    },
    ProcessPayment {
        order_id: String,
        payment: Value,
    },
    InventoryAdjustment {
        adjustment: Value,
    },
    /// Queued by a different build or no longer decodable; never dispatched by this one.
    Unrecognized {
        command_type: String,
        payload: Value,
        reason: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddOrderItemBody {
    order_id: String,
    item: Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendOrderBody {
    order_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KdsBumpBody {
    station_id: String,
    ticket_id: String,
    status: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessPaymentBody {
    order_id: String,
    payment: Value,
}

impl Command {
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::CreateOrder { .. } => CommandType::CreateOrder,
            Command::AddOrderItem { .. } => CommandType::AddOrderItem,
            Command::SendOrder { .. } => CommandType::SendOrder,
            Command::KdsBump { .. } => CommandType::KdsBump,
            Command::ProcessPayment { .. } => CommandType::ProcessPayment,
            Command::InventoryAdjustment { .. } => CommandType::InventoryAdjustment,
            Command::Unrecognized { command_type, .. } => {
                CommandType::Unrecognized(command_type.clone())
            }
        }
    }

    /// Rebuilds a command from its stored tag and payload.
    ///
    /// Unknown tags, unknown payload versions and payloads that no longer match their
    /// declared shape all decode to [`Command::Unrecognized`].
    pub fn decode(command_type: &CommandType, payload: &CommandPayload, version: u32) -> Self {
        let unrecognized = |reason: String| Command::Unrecognized {
            command_type: command_type.as_str().to_string(),
            payload: payload.as_json().clone(),
            reason,
        };

        if version != CURRENT_PAYLOAD_VERSION {
            return unrecognized(format!("unsupported payload version {version}"));
        }

        let json = payload.as_json();
        let decoded = match command_type {
            CommandType::CreateOrder => Ok(Command::CreateOrder {
                order: json.clone(),
            }),
            CommandType::AddOrderItem => decode_body::<AddOrderItemBody>(json).map(|body| {
                Command::AddOrderItem {
                    order_id: body.order_id,
                    item: body.item,
                }
            }),
            CommandType::SendOrder => decode_body::<SendOrderBody>(json).map(|body| {
                Command::SendOrder {
                    order_id: body.order_id,
                }
            }),
            CommandType::KdsBump => decode_body::<KdsBumpBody>(json).map(|body| Command::KdsBump {
                station_id: body.station_id,
                ticket_id: body.ticket_id,
                status: body.status,
            }),
            CommandType::ProcessPayment => decode_body::<ProcessPaymentBody>(json).map(|body| {
                Command::ProcessPayment {
                    order_id: body.order_id,
                    payment: body.payment,
                }
            }),
            CommandType::InventoryAdjustment => Ok(Command::InventoryAdjustment {
                adjustment: json.clone(),
            }),
            CommandType::Unrecognized(tag) => Err(format!("unknown command type {tag}")),
        };

        decoded.unwrap_or_else(unrecognized)
    }

    /// Payload persisted in the queue for this command.
    pub fn to_payload(&self) -> Result<CommandPayload, String> {
        let value = match self {
            Command::CreateOrder { order } => order.clone(),
            Command::AddOrderItem { order_id, item } => encode_body(&AddOrderItemBody {
                order_id: order_id.clone(),
                item: item.clone(),
            })?,
            Command::SendOrder { order_id } => encode_body(&SendOrderBody {
                order_id: order_id.clone(),
            })?,
            Command::KdsBump {
                station_id,
                ticket_id,
                status,
            } => encode_body(&KdsBumpBody {
                station_id: station_id.clone(),
                ticket_id: ticket_id.clone(),
                status: status.clone(),
            })?,
            Command::ProcessPayment { order_id, payment } => encode_body(&ProcessPaymentBody {
                order_id: order_id.clone(),
                payment: payment.clone(),
            })?,
            Command::InventoryAdjustment { adjustment } => adjustment.clone(),
            Command::Unrecognized { payload, .. } => payload.clone(),
        };
        CommandPayload::new(value)
    }

    /// Parent entity this command is addressed to, if any.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Command::AddOrderItem { order_id, .. }
            | Command::SendOrder { order_id }
            | Command::ProcessPayment { order_id, .. } => Some(order_id.as_str()),
            _ => None,
        }
    }

    /// True when the parent is an offline placeholder the server cannot resolve yet.
    pub fn targets_placeholder(&self) -> bool {
        self.parent_id().is_some_and(is_placeholder)
    }

    /// Replaces the parent id, used once a placeholder's server id is known.
    pub fn with_parent_id(self, parent_id: String) -> Self {
        match self {
            Command::AddOrderItem { item, .. } => Command::AddOrderItem {
                order_id: parent_id,
                item,
            },
            Command::SendOrder { .. } => Command::SendOrder {
                order_id: parent_id,
            },
            Command::ProcessPayment { payment, .. } => Command::ProcessPayment {
                order_id: parent_id,
                payment,
            },
            other => other,
        }
    }

    /// Whether a successful delivery creates a new server entity with its own id.
    pub fn creates_entity(&self) -> bool {
        matches!(self, Command::CreateOrder { .. })
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Command::Unrecognized { .. })
    }
}

fn decode_body<T: DeserializeOwned>(value: &Value) -> Result<T, String> {
    serde_json::from_value(value.clone()).map_err(|err| format!("payload shape mismatch: {err}"))
}

fn encode_body<T: Serialize>(body: &T) -> Result<Value, String> {
    serde_json::to_value(body).map_err(|err| format!("failed to encode payload: {err}"))
}
