pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;

use crate::{
    middleware::{require_capability, AuthState},
    openapi::ApiDoc,
    routes::{
        ai_service_health, assistant_chat, chat_completions, gateway_health, list_ai_providers,
    },
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use config::{ApiConfig, ProviderConfig};
use inference_providers::{
    AssistantProvider, CompletionError, InferenceProvider, OpenAiCompatibleProvider,
    ProviderCredential,
};
use services::{
    auth::{AuthorizationService, StaticTokenAuthorizer, AI_CHAT_CAPABILITY},
    completions::CompletionServiceTrait,
    CompletionServiceImpl,
};
use std::{sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// State shared by the completion and admin handlers
#[derive(Clone)]
pub struct AppState {
    pub completion_service: Arc<dyn CompletionServiceTrait>,
    /// Identifier of the configured provider
    pub provider_name: String,
    pub assistant_model: String,
}

/// Everything the router needs, built once at startup
#[derive(Clone)]
pub struct DomainServices {
    pub completion_service: Arc<dyn CompletionServiceTrait>,
    pub authorizer: Arc<dyn AuthorizationService>,
    pub provider_name: String,
    pub assistant_model: String,
}

/// Build the shared provider credential from configuration
pub fn provider_credential(config: &ProviderConfig) -> ProviderCredential {
    ProviderCredential {
        base_url: config.base_url.clone(),
        api_key: config.api_key.clone(),
        default_model: config.default_model.clone(),
        timeout: Duration::from_secs(config.timeout_seconds),
        stream_timeout: config.stream_timeout_seconds.map(Duration::from_secs),
    }
}

/// Initialize the direct provider client with its pooled HTTP client
pub fn init_inference_provider(
    provider_name: &str,
    credential: Arc<ProviderCredential>,
) -> Result<Arc<dyn InferenceProvider>, CompletionError> {
    tracing::info!(
        provider = %provider_name,
        base_url = %credential.base_url,
        default_model = %credential.default_model,
        "Initializing inference provider"
    );
    Ok(Arc::new(OpenAiCompatibleProvider::new(credential)?))
}

/// Wire the completion service and authorizer around an existing provider
pub fn init_domain_services_with_provider(
    config: &ApiConfig,
    provider: Arc<dyn InferenceProvider>,
) -> DomainServices {
    let credential = provider_credential(&config.provider);
    wire_domain_services(config, &credential, provider)
}

pub fn init_domain_services(config: &ApiConfig) -> Result<DomainServices, CompletionError> {
    let credential = Arc::new(provider_credential(&config.provider));
    let provider = init_inference_provider(&config.provider.name, credential.clone())?;
    Ok(wire_domain_services(config, &credential, provider))
}

fn wire_domain_services(
    config: &ApiConfig,
    credential: &ProviderCredential,
    provider: Arc<dyn InferenceProvider>,
) -> DomainServices {
    let mut assistant = AssistantProvider::new(provider.clone(), credential);
    if let Some(system_prompt) = &config.provider.assistant_system_prompt {
        assistant = assistant.with_system_prompt(system_prompt.as_str());
    }
    let assistant_model = assistant.default_model().to_string();

    let authorizer = StaticTokenAuthorizer::new(&config.auth);
    if authorizer.is_empty() {
        tracing::warn!("No auth tokens configured, the assistant endpoint will reject every call");
    }

    DomainServices {
        completion_service: Arc::new(CompletionServiceImpl::new(provider, Arc::new(assistant))),
        authorizer: Arc::new(authorizer),
        provider_name: config.provider.name.clone(),
        assistant_model,
    }
}

/// Build the complete application router
pub fn build_app(domain_services: DomainServices) -> Router {
    let app_state = AppState {
        completion_service: domain_services.completion_service.clone(),
        provider_name: domain_services.provider_name.clone(),
        assistant_model: domain_services.assistant_model.clone(),
    };
    let auth_state = AuthState::new(domain_services.authorizer.clone(), AI_CHAT_CAPABILITY);

    Router::new()
        .merge(build_completion_routes(app_state.clone()))
        .merge(build_assistant_routes(app_state.clone(), auth_state))
        .merge(build_admin_routes(app_state))
        .merge(build_openapi_routes())
        .layer(TraceLayer::new_for_http())
}

pub fn build_completion_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(app_state)
}

/// Assistant routes, behind the capability check
pub fn build_assistant_routes(app_state: AppState, auth_state: AuthState) -> Router {
    Router::new()
        .route("/v1/ai/chat", post(assistant_chat))
        .with_state(app_state)
        .layer(from_fn_with_state(auth_state, require_capability))
}

/// Health and AI service administration, unauthenticated
pub fn build_admin_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(gateway_health))
        .nest(
            "/admin/ai_service",
            Router::new()
                .route("/health", get(ai_service_health))
                .route("/providers", get(list_ai_providers)),
        )
        .with_state(app_state)
}

/// Build OpenAPI documentation routes
pub fn build_openapi_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use futures::StreamExt;
    use inference_providers::MockProvider;
    use tower::ServiceExt;

    fn test_config() -> ApiConfig {
        let mut config = ApiConfig::default();
        config.provider.api_key = "sk-test".to_string();
        config
    }

    #[test]
    fn test_provider_credential_from_config() {
        let mut config = test_config().provider;
        config.timeout_seconds = 5;
        config.stream_timeout_seconds = Some(600);

        let credential = provider_credential(&config);
        assert_eq!(credential.timeout, Duration::from_secs(5));
        assert_eq!(credential.stream_timeout, Some(Duration::from_secs(600)));
        assert_eq!(credential.api_key, "sk-test");
    }

    #[tokio::test]
    async fn test_app_setup() {
        let config = test_config();
        let services = init_domain_services_with_provider(&config, Arc::new(MockProvider::new()));
        let app = build_app(services);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_assistant_prompts_the_credential_model() {
        let mut config = test_config();
        config.provider.default_model = "qwen-turbo".to_string();
        config.provider.assistant_system_prompt = Some("Reply in French.".to_string());
        let mock = Arc::new(MockProvider::new());
        let services = init_domain_services_with_provider(&config, mock.clone());
        assert_eq!(services.assistant_model, "qwen-turbo");

        let _: Vec<_> = services
            .completion_service
            .assistant_stream("bonjour".to_string())
            .await
            .collect()
            .await;

        let captured = mock.captured_params().await;
        assert_eq!(captured[0].model(), Some("qwen-turbo"));
        assert_eq!(captured[0].message_text(0), Some("Reply in French."));
        assert_eq!(captured[0].message_text(1), Some("bonjour"));
    }

    #[tokio::test]
    async fn test_init_domain_services_builds_real_client() {
        let services = init_domain_services(&test_config()).unwrap();
        assert_eq!(services.provider_name, "openai");
    }
}
