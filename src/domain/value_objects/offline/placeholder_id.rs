use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const OFFLINE_ID_PREFIX: &str = "offline-";

/// Locally generated identifier for an entity that has not reached the server yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceholderId(String);

impl PlaceholderId {
    pub fn generate() -> Self {
        Self(format!("{OFFLINE_ID_PREFIX}{}", Uuid::new_v4()))
    }

    pub fn new(value: String) -> Result<Self, String> {
        if !is_placeholder(&value) {
            return Err(format!(
                "Placeholder id must start with '{OFFLINE_ID_PREFIX}': {value}"
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether `id` names an offline placeholder rather than a server record.
pub fn is_placeholder(id: &str) -> bool {
    id.len() > OFFLINE_ID_PREFIX.len() && id.starts_with(OFFLINE_ID_PREFIX)
}

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PlaceholderId> for String {
    fn from(id: PlaceholderId) -> Self {
        id.0
    }
}

/// What became of a placeholder whose creating command reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderResolution {
    Resolved(String),
    /// The create succeeded but the response named no id to rewrite children with.
    MissingServerId,
}

impl PlaceholderResolution {
    pub fn from_server_id(server_id: Option<String>) -> Self {
        match server_id {
            Some(id) => Self::Resolved(id),
            None => Self::MissingServerId,
        }
    }
}
