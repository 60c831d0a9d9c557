use crate::{
    models::{GatewayHealthResponse, ProviderInfoResponse, ServiceHealthResponse},
    AppState,
};
use axum::{extract::State, response::Json as ResponseJson};
use services::providers::list_providers;

const SERVICE_NAME: &str = "module_ai_service";

/// Gateway health
///
/// Requires no authentication and never contacts the provider.
#[utoipa::path(
    get,
    path = "/v1/health",
    tag = "Health",
    responses((status = 200, description = "Gateway is up", body = GatewayHealthResponse))
)]
pub async fn gateway_health(
    State(app_state): State<AppState>,
) -> ResponseJson<GatewayHealthResponse> {
    ResponseJson(GatewayHealthResponse {
        status: "ok".to_string(),
        provider: app_state.provider_name.clone(),
        assistant_model: app_state.assistant_model.clone(),
    })
}

/// AI service module health
#[utoipa::path(
    get,
    path = "/admin/ai_service/health",
    tag = "Admin",
    responses((status = 200, description = "Module is up", body = ServiceHealthResponse))
)]
pub async fn ai_service_health() -> ResponseJson<ServiceHealthResponse> {
    ResponseJson(ServiceHealthResponse {
        ok: true,
        service: SERVICE_NAME.to_string(),
    })
}

/// Providers the gateway knows about, configured one first
#[utoipa::path(
    get,
    path = "/admin/ai_service/providers",
    tag = "Admin",
    responses((status = 200, description = "Provider list", body = Vec<ProviderInfoResponse>))
)]
pub async fn list_ai_providers(
    State(app_state): State<AppState>,
) -> ResponseJson<Vec<ProviderInfoResponse>> {
    ResponseJson(
        list_providers(&app_state.provider_name)
            .into_iter()
            .map(ProviderInfoResponse::from)
            .collect(),
    )
}
