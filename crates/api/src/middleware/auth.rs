use crate::models::ErrorResponse;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use services::auth::{AuthError, AuthorizationService, Identity};
use std::sync::Arc;

/// Identity of the caller, inserted into request extensions once authorized
#[derive(Clone, Debug)]
pub struct AuthenticatedIdentity(pub Identity);

#[derive(Clone)]
pub struct AuthState {
    pub authorizer: Arc<dyn AuthorizationService>,
    /// Capability every request behind this layer must hold
    pub capability: &'static str,
}

impl AuthState {
    pub fn new(authorizer: Arc<dyn AuthorizationService>, capability: &'static str) -> Self {
        Self {
            authorizer,
            capability,
        }
    }
}

pub fn auth_error_response(error: &AuthError) -> (StatusCode, axum::Json<ErrorResponse>) {
    let (status, error_type) = match error {
        AuthError::MissingToken | AuthError::InvalidToken => {
            (StatusCode::UNAUTHORIZED, "unauthorized")
        }
        AuthError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
    };
    (
        status,
        axum::Json(ErrorResponse::new(error.to_string(), error_type.to_string())),
    )
}

/// Require a bearer token whose owner holds `state.capability`
pub async fn require_capability(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, axum::Json<ErrorResponse>)> {
    let token = match request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(token) => token.trim().to_string(),
            None => {
                tracing::debug!("Authorization header does not start with 'Bearer '");
                return Err(auth_error_response(&AuthError::InvalidToken));
            }
        },
        None => return Err(auth_error_response(&AuthError::MissingToken)),
    };

    let identity = state
        .authorizer
        .authorize(&token, state.capability)
        .await
        .map_err(|e| auth_error_response(&e))?;

    tracing::debug!(user = %identity.user, capability = state.capability, "Caller authorized");
    request
        .extensions_mut()
        .insert(AuthenticatedIdentity(identity));
    Ok(next.run(request).await)
}
