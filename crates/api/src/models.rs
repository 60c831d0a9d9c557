use serde::{Deserialize, Serialize};
use services::{
    completions::DomainError,
    providers::{ProviderInfo, ProviderStatus},
};
use utoipa::ToSchema;

/// Documentation shape of a chat completion request
///
/// The handler accepts any OpenAI-style body; fields not listed here are forwarded
/// to the provider unchanged. The body's own `stream` field is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionRequest {
    /// Model ID forwarded to the provider
    pub model: String,
    /// Role-tagged messages
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
}

/// Request body of the assistant chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssistantChatRequest {
    /// Free-text question
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: String, error_type: String) -> Self {
        Self {
            error: ErrorDetail {
                message,
                r#type: error_type,
                param: None,
                code: None,
            },
        }
    }
}

impl From<&DomainError> for ErrorResponse {
    fn from(error: &DomainError) -> Self {
        Self::new(error.message.clone(), error.kind.as_str().to_string())
    }
}

/// Gateway liveness and the provider it forwards to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayHealthResponse {
    /// Always `ok` while the process serves requests
    pub status: String,
    /// Identifier of the configured provider
    pub provider: String,
    /// Model the assistant endpoint prompts
    pub assistant_model: String,
}

/// Health of the AI service module
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceHealthResponse {
    pub ok: bool,
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderInfoResponse {
    pub id: String,
    pub name: String,
    /// `available` when configured, `unknown` otherwise
    pub status: String,
}

impl From<ProviderInfo> for ProviderInfoResponse {
    fn from(info: ProviderInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            status: match info.status {
                ProviderStatus::Available => "available",
                ProviderStatus::Unknown => "unknown",
            }
            .to_string(),
        }
    }
}
