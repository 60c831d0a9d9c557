use crate::{models::*, routes::common::domain_error_response, AppState};
use axum::{
    extract::{rejection::JsonRejection, Json, Query, State},
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json as ResponseJson, Response,
    },
};
use futures::stream::StreamExt;
use inference_providers::ChatCompletionParams;
use serde::Deserialize;
use services::completions::{DeliveryMode, Dispatched, RelayFrame};
use std::{convert::Infallible, time::Duration};
use utoipa::IntoParams;

const EVENT_STREAM: &str = "text/event-stream";

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CompletionQuery {
    /// Stream the response as server-sent events (`true`, `1`, `yes`, `on`)
    pub stream: Option<String>,
}

impl CompletionQuery {
    pub fn wants_stream(&self) -> bool {
        self.stream.as_deref().is_some_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            )
        })
    }
}

fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.to_ascii_lowercase().contains(EVENT_STREAM))
}

/// SSE field values may not carry carriage returns
fn strip_cr(text: String) -> String {
    if text.contains('\r') {
        text.replace('\r', "")
    } else {
        text
    }
}

/// Outbound SSE event for one relay frame
pub fn frame_to_event(frame: RelayFrame) -> Event {
    match frame {
        RelayFrame::Data(payload) => Event::default().data(strip_cr(payload)),
        RelayFrame::Done => Event::default().event("done").data("[DONE]"),
        RelayFrame::Error(e) => Event::default().event("error").data(strip_cr(e.message)),
    }
}

/// Create a chat completion
///
/// The body is forwarded to the provider unchanged apart from its `stream` flag,
/// which the gateway sets itself. Streaming is selected by `?stream=true` or by an
/// `Accept: text/event-stream` header; either is enough.
#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    tag = "Chat",
    params(CompletionQuery),
    request_body = ChatCompletionRequest,
    responses(
        (status = 200, description = "Provider's completion document, or an event stream of `data` frames ending in one `done` or `error` event"),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Provider rejected the credential", body = ErrorResponse),
        (status = 402, description = "Provider account has a billing problem", body = ErrorResponse),
        (status = 403, description = "Provider denied access", body = ErrorResponse),
        (status = 429, description = "Provider quota exhausted", body = ErrorResponse),
        (status = 502, description = "Unclassified provider failure", body = ErrorResponse),
        (status = 503, description = "Provider unavailable", body = ErrorResponse)
    )
)]
pub async fn chat_completions(
    State(app_state): State<AppState>,
    Query(query): Query<CompletionQuery>,
    headers: HeaderMap,
    body: Result<Json<ChatCompletionParams>, JsonRejection>,
) -> Response {
    let Json(params) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!("Rejected chat completion body: {}", rejection);
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

    let mode = DeliveryMode::from_signals(query.wants_stream(), accepts_event_stream(&headers));
    tracing::info!(
        model = params.model().unwrap_or_default(),
        messages = params.messages().len(),
        stream = mode.is_stream(),
        "Chat completion request"
    );

    match app_state.completion_service.dispatch(params, mode).await {
        Ok(Dispatched::Complete(result)) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "application/json")],
            result.raw_bytes,
        )
            .into_response(),
        Ok(Dispatched::Stream(frames)) => {
            let events = frames.map(|frame| Ok::<_, Infallible>(frame_to_event(frame)));
            Sse::new(events)
                .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
                .into_response()
        }
        Err(e) => domain_error_response(&e),
    }
}
