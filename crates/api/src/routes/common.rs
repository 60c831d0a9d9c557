use crate::models::ErrorResponse;
use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Json as ResponseJson, Response},
};
use services::completions::{DomainError, DomainErrorKind};

/// Map domain error kinds to HTTP status codes
pub fn map_domain_error_to_status(kind: DomainErrorKind) -> StatusCode {
    match kind {
        DomainErrorKind::Auth => StatusCode::UNAUTHORIZED,
        DomainErrorKind::Permission => StatusCode::FORBIDDEN,
        DomainErrorKind::Billing => StatusCode::PAYMENT_REQUIRED,
        DomainErrorKind::Quota => StatusCode::TOO_MANY_REQUESTS,
        DomainErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        DomainErrorKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        DomainErrorKind::UnknownProvider => StatusCode::BAD_GATEWAY,
        DomainErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Single error response for a failed non-streaming call
pub fn domain_error_response(error: &DomainError) -> Response {
    let mut response = (
        map_domain_error_to_status(error.kind),
        ResponseJson(ErrorResponse::from(error)),
    )
        .into_response();

    if let Some(seconds) = error.retry_after {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(seconds));
    }
    response
}
