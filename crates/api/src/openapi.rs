use crate::models::*;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Completion Gateway API",
        description = "Streaming gateway in front of an OpenAI-compatible chat completion provider.\n\n## Delivery modes\n\n`POST /v1/chat/completions` returns the provider's JSON document, or a `text/event-stream` when `?stream=true` is set or the `Accept` header asks for `text/event-stream`.\n\n## Authentication\n\nThe assistant endpoint requires `Authorization: Bearer <token>` for a caller holding the `module_application:ai:chat` capability.",
        version = "1.0.0",
        license(
            name = "MIT",
        )
    ),
    paths(
        crate::routes::completions::chat_completions,
        crate::routes::assistant::assistant_chat,
        crate::routes::admin::gateway_health,
        crate::routes::admin::ai_service_health,
        crate::routes::admin::list_ai_providers,
    ),
    components(
        schemas(
            ChatCompletionRequest, AssistantChatRequest, ErrorResponse, ErrorDetail,
            GatewayHealthResponse, ServiceHealthResponse, ProviderInfoResponse,
        ),
    ),
    tags(
        (name = "Chat", description = "Chat completions"),
        (name = "Assistant", description = "Single-question assistant"),
        (name = "Health", description = "Liveness"),
        (name = "Admin", description = "AI service module administration"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security configuration for OpenAPI
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
