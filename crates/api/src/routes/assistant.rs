use crate::{
    middleware::AuthenticatedIdentity,
    models::{AssistantChatRequest, ErrorResponse},
    AppState,
};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Extension, Json, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json as ResponseJson, Response},
};
use bytes::Bytes;
use futures::stream::StreamExt;
use std::convert::Infallible;

const PREVIEW_CHARS: usize = 50;

/// Fragment appended to the stream when the answer fails part-way
pub fn apology_fragment(message: &str) -> String {
    format!("Sorry, an error occurred while processing your request: {message}")
}

/// Ask the assistant a question
///
/// The answer is streamed as raw text fragments with no event framing; the
/// client concatenates them. A failure ends the stream with one apology fragment.
#[utoipa::path(
    post,
    path = "/v1/ai/chat",
    tag = "Assistant",
    request_body = AssistantChatRequest,
    responses(
        (status = 200, description = "Streamed answer text", content_type = "text/plain"),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Missing capability", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn assistant_chat(
    State(app_state): State<AppState>,
    Extension(AuthenticatedIdentity(identity)): Extension<AuthenticatedIdentity>,
    body: Result<Json<AssistantChatRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                ResponseJson(ErrorResponse::new(
                    rejection.body_text(),
                    "invalid_request_error".to_string(),
                )),
            )
                .into_response();
        }
    };

    let preview: String = request.message.chars().take(PREVIEW_CHARS).collect();
    tracing::info!(user = %identity.user, message = %preview, "Assistant chat request");

    let fragments = app_state
        .completion_service
        .assistant_stream(request.message)
        .await
        .map(|item| {
            let text = match item {
                Ok(text) => text,
                Err(e) => apology_fragment(&e.message),
            };
            Ok::<_, Infallible>(Bytes::from(text))
        });

    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(fragments),
    )
        .into_response()
}
