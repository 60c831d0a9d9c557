#![allow(dead_code)]

use api::{build_app, init_domain_services_with_provider};
use config::{ApiConfig, AuthConfig, AuthTokenConfig};
use inference_providers::MockProvider;
use services::auth::AI_CHAT_CAPABILITY;
use std::sync::Arc;

/// Token holding the assistant capability
pub const CHAT_TOKEN: &str = "tok-chat";
/// Token of a known user without any capability
pub const NO_CAPABILITY_TOKEN: &str = "tok-nocap";

/// Helper function to create a test configuration
pub fn test_config() -> ApiConfig {
    let mut config = ApiConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.provider.api_key = "sk-test".to_string();
    config.provider.default_model = "mock-model".to_string();
    config.auth = AuthConfig {
        tokens: vec![
            AuthTokenConfig {
                token: CHAT_TOKEN.to_string(),
                user: "alice".to_string(),
                capabilities: vec![AI_CHAT_CAPABILITY.to_string()],
            },
            AuthTokenConfig {
                token: NO_CAPABILITY_TOKEN.to_string(),
                user: "bob".to_string(),
                capabilities: vec![],
            },
        ],
    };
    config
}

pub fn build_test_app(mock: Arc<MockProvider>) -> axum::Router {
    build_app(init_domain_services_with_provider(&test_config(), mock))
}

/// Test server over the full router with a scripted provider
pub fn setup_test_server() -> (axum_test::TestServer, Arc<MockProvider>) {
    let mock = Arc::new(MockProvider::new());
    let server = axum_test::TestServer::new(build_test_app(mock.clone())).unwrap();
    (server, mock)
}

/// One parsed server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Split an event-stream body into events, ignoring comment lines
pub fn parse_sse(body: &str) -> Vec<SseEvent> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut event = None;
            let mut data: Vec<&str> = Vec::new();
            for line in block.lines() {
                if let Some(name) = line.strip_prefix("event:") {
                    event = Some(name.trim().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push(value.strip_prefix(' ').unwrap_or(value));
                }
            }
            if event.is_none() && data.is_empty() {
                None
            } else {
                Some(SseEvent {
                    event,
                    data: data.join("\n"),
                })
            }
        })
        .collect()
}

pub fn chat_body() -> serde_json::Value {
    serde_json::json!({
        "model": "mock-model",
        "messages": [{"role": "user", "content": "Say hello"}],
        "temperature": 0.2
    })
}
