use async_trait::async_trait;

/// Read-only view of the session's bearer credential.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetched fresh for every dispatch; a token may rotate while commands wait.
    async fn bearer_token(&self) -> Option<String>;
}
