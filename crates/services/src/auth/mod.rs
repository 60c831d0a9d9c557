pub mod ports;

use async_trait::async_trait;
use config::AuthConfig;
use std::collections::HashMap;

pub use ports::{AuthError, AuthorizationService, Identity, AI_CHAT_CAPABILITY};

#[cfg(any(test, feature = "test-mocks"))]
pub use ports::MockAuthorizationService;

/// Authorizer backed by the static token table from configuration
pub struct StaticTokenAuthorizer {
    identities: HashMap<String, Identity>,
}

impl StaticTokenAuthorizer {
    pub fn new(config: &AuthConfig) -> Self {
        let identities = config
            .tokens
            .iter()
            .map(|entry| {
                (
                    entry.token.clone(),
                    Identity {
                        user: entry.user.clone(),
                        capabilities: entry.capabilities.clone(),
                    },
                )
            })
            .collect();
        Self { identities }
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[async_trait]
impl AuthorizationService for StaticTokenAuthorizer {
    async fn authorize(&self, token: &str, capability: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let identity = self.identities.get(token).ok_or(AuthError::InvalidToken)?;
        if !identity.has_capability(capability) {
            tracing::info!(
                user = %identity.user,
                capability,
                "Caller lacks required capability"
            );
            return Err(AuthError::Forbidden {
                capability: capability.to_string(),
            });
        }

        Ok(identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::AuthTokenConfig;

    fn authorizer() -> StaticTokenAuthorizer {
        StaticTokenAuthorizer::new(&AuthConfig {
            tokens: vec![
                AuthTokenConfig {
                    token: "tok-alice".to_string(),
                    user: "alice".to_string(),
                    capabilities: vec![AI_CHAT_CAPABILITY.to_string()],
                },
                AuthTokenConfig {
                    token: "tok-bob".to_string(),
                    user: "bob".to_string(),
                    capabilities: vec![],
                },
            ],
        })
    }

    #[tokio::test]
    async fn test_authorize() {
        let auth = authorizer();

        let identity = auth.authorize("tok-alice", AI_CHAT_CAPABILITY).await.unwrap();
        assert_eq!(identity.user, "alice");

        assert_eq!(
            auth.authorize("tok-bob", AI_CHAT_CAPABILITY).await,
            Err(AuthError::Forbidden {
                capability: AI_CHAT_CAPABILITY.to_string()
            })
        );
        assert_eq!(
            auth.authorize("tok-eve", AI_CHAT_CAPABILITY).await,
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            auth.authorize("", AI_CHAT_CAPABILITY).await,
            Err(AuthError::MissingToken)
        );
    }
}
