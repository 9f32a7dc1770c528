use super::OptimisticRecord;
use crate::domain::value_objects::CommandId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionData {
    Optimistic(OptimisticRecord),
    Authoritative(Value),
}

/// Result handed back to UI callers of `perform`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub mode: ActionMode,
    pub queued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<CommandId>,
    pub data: ActionData,
}

impl ActionOutcome {
    pub fn online(data: Value) -> Self {
        Self {
            mode: ActionMode::Online,
            queued: false,
            command_id: None,
            data: ActionData::Authoritative(data),
        }
    }

    pub fn offline(command_id: CommandId, record: OptimisticRecord) -> Self {
        Self {
            mode: ActionMode::Offline,
            queued: true,
            command_id: Some(command_id),
            data: ActionData::Optimistic(record),
        }
    }

    pub fn optimistic_record(&self) -> Option<&OptimisticRecord> {
        match &self.data {
            ActionData::Optimistic(record) => Some(record),
            ActionData::Authoritative(_) => None,
        }
    }
}
