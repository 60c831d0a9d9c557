use async_trait::async_trait;
use serde::Serialize;

#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;

/// Capability required by the assistant chat endpoint
pub const AI_CHAT_CAPABILITY: &str = "module_application:ai:chat";

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user: String,
    pub capabilities: Vec<String>,
}

impl Identity {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid authorization token")]
    InvalidToken,
    #[error("Missing required capability: {capability}")]
    Forbidden { capability: String },
}

/// Checks that a bearer token belongs to a caller holding a capability
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn authorize(&self, token: &str, capability: &str) -> Result<Identity, AuthError>;
}
