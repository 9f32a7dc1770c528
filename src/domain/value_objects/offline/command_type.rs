use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a queued command. The stored tag is the upper snake case form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandType {
    CreateOrder,
    AddOrderItem,
    SendOrder,
    KdsBump,
    ProcessPayment,
    InventoryAdjustment,
    /// A tag this build does not know, kept verbatim so it survives in the queue.
    Unrecognized(String),
}

impl CommandType {
    pub const KNOWN: [CommandType; 6] = [
        CommandType::CreateOrder,
        CommandType::AddOrderItem,
        CommandType::SendOrder,
        CommandType::KdsBump,
        CommandType::ProcessPayment,
        CommandType::InventoryAdjustment,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            CommandType::CreateOrder => "CREATE_ORDER",
            CommandType::AddOrderItem => "ADD_ORDER_ITEM",
            CommandType::SendOrder => "SEND_ORDER",
            CommandType::KdsBump => "KDS_BUMP",
            CommandType::ProcessPayment => "PROCESS_PAYMENT",
            CommandType::InventoryAdjustment => "INVENTORY_ADJUSTMENT",
            CommandType::Unrecognized(value) => value.as_str(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, CommandType::Unrecognized(_))
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for CommandType {
    fn from(value: &str) -> Self {
        match value {
            "CREATE_ORDER" => CommandType::CreateOrder,
            "ADD_ORDER_ITEM" => CommandType::AddOrderItem,
            "SEND_ORDER" => CommandType::SendOrder,
            "KDS_BUMP" => CommandType::KdsBump,
            "PROCESS_PAYMENT" => CommandType::ProcessPayment,
            "INVENTORY_ADJUSTMENT" => CommandType::InventoryAdjustment,
            other => CommandType::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for CommandType {
    fn from(value: String) -> Self {
        CommandType::from(value.as_str())
    }
}

impl From<CommandType> for String {
    fn from(kind: CommandType) -> Self {
        kind.as_str().to_string()
    }
}
