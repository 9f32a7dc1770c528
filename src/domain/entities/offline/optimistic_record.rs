use crate::domain::value_objects::{CommandType, PlaceholderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client-side stand-in for a server record, replaced once the real one arrives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimisticRecord {
    pub id: PlaceholderId,
    pub command_type: CommandType,
    pub attributes: Value,
    pub originated_offline: bool,
    pub sync_pending: bool,
    pub created_at: DateTime<Utc>,
}

impl OptimisticRecord {
    pub fn new(id: PlaceholderId, command_type: CommandType, attributes: Value) -> Self {
        Self {
            id,
            command_type,
            attributes,
            originated_offline: true,
            sync_pending: true,
            created_at: Utc::now(),
        }
    }
}
