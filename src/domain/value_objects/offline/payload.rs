use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current shape version written with every queued payload.
pub const CURRENT_PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandPayload(Value);

impl CommandPayload {
    pub fn new(value: Value) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Canonical serialized form; object keys are emitted in sorted order.
    pub fn to_canonical_string(&self) -> String {
        canonicalize(&self.0).to_string()
    }

    fn validate(value: &Value) -> Result<(), String> {
        if value.is_null() {
            return Err("Command payload cannot be null".to_string());
        }
        Ok(())
    }
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key.clone(), canonicalize(inner)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

impl From<CommandPayload> for Value {
    fn from(payload: CommandPayload) -> Self {
        payload.0
    }
}
