use crate::application::ports::credentials::CredentialSource;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Holds the signed-in operator's bearer token.
#[derive(Default)]
pub struct SessionCredentials {
    token: RwLock<Option<String>>,
}

impl SessionCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|value| !value.trim().is_empty())),
        }
    }

    pub async fn set_token(&self, token: String) {
        let mut guard = self.token.write().await;
        *guard = Some(token).filter(|value| !value.trim().is_empty());
    }

    pub async fn clear(&self) {
        let mut guard = self.token.write().await;
        *guard = None;
        tracing::info!(target: "offline::replay", "session credential cleared");
    }
}

#[async_trait]
impl CredentialSource for SessionCredentials {
    async fn bearer_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}
