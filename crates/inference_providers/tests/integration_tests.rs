//! Integration tests for the OpenAI-compatible provider
//!
//! An httpmock server plays the upstream so the real HTTP client, header handling
//! and stream parsing are exercised end to end.
//! Run with: `cargo test --test integration_tests -- --nocapture`

use futures_util::StreamExt;
use httpmock::prelude::*;
use inference_providers::{
    ChatCompletionParams, ChatMessage, CompletionError, InferenceProvider,
    OpenAiCompatibleProvider, ProviderCredential,
};
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;

fn create_provider(server: &MockServer) -> OpenAiCompatibleProvider {
    let credential = ProviderCredential::new(server.url("/v1"), "sk-test-key");
    OpenAiCompatibleProvider::new(Arc::new(credential)).expect("client should build")
}

fn params() -> ChatCompletionParams {
    // a caller-supplied flag must be overwritten, never trusted
    ChatCompletionParams::from_messages("gpt-4o-mini", vec![ChatMessage::user("Say hello")])
        .with_stream(true)
}

#[tokio::test]
async fn test_call_sync_returns_provider_bytes_unchanged() {
    let server = MockServer::start_async().await;
    // odd spacing and key order must survive
    let upstream_body = r#"{"id":"chatcmpl-1",  "object":"chat.completion","choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test-key")
                .json_body_partial(r#"{"stream": false, "model": "gpt-4o-mini"}"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(upstream_body);
        })
        .await;

    let provider = create_provider(&server);
    let result = provider.call_sync(params()).await.expect("sync call");

    mock.assert_async().await;
    assert_eq!(result.raw_bytes.as_ref(), upstream_body.as_bytes());
    assert_eq!(result.response["choices"][0]["message"]["content"], "hi");
}

#[tokio::test]
async fn test_caller_body_is_posted_as_sent() {
    let server = MockServer::start_async().await;
    let caller_body = serde_json::json!({
        "model": "",
        "messages": [{"role": "ipython", "content": "42", "tool_call_id": "call_1"}],
        "max_tokens": 12.5,
        "logit_bias": {"50256": -100},
        "stream": true
    });
    let mut expected = caller_body.clone();
    expected["stream"] = serde_json::json!(false);

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body(expected);
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"choices":[]}"#);
        })
        .await;

    let params: ChatCompletionParams =
        serde_json::from_value(caller_body).expect("object body");
    create_provider(&server)
        .call_sync(params)
        .await
        .expect("sync call");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_call_sync_reports_http_error_with_body() {
    let server = MockServer::start_async().await;
    let error_body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401)
                .header("content-type", "application/json")
                .body(error_body);
        })
        .await;

    let provider = create_provider(&server);
    match provider.call_sync(params()).await {
        Err(CompletionError::HttpError {
            status_code,
            body,
            retry_after,
        }) => {
            assert_eq!(status_code, 401);
            assert_eq!(body, error_body);
            assert_eq!(retry_after, None);
        }
        other => panic!("expected HttpError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_retry_after_header_is_captured() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429)
                .header("retry-after", "7")
                .body(r#"{"error":{"type":"rate_limit_exceeded","message":"slow down"}}"#);
        })
        .await;

    let provider = create_provider(&server);
    let err = match provider.stream_call(params()).await {
        Err(e) => e,
        Ok(_) => panic!("stream should not open on 429"),
    };

    assert!(matches!(
        err,
        CompletionError::HttpError {
            status_code: 429,
            retry_after: Some(7),
            ..
        }
    ));
}

#[tokio::test]
async fn test_call_sync_rejects_non_json_success() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).body("<html>gateway</html>");
        })
        .await;

    let provider = create_provider(&server);
    let err = provider.call_sync(params()).await.unwrap_err();
    assert!(matches!(err, CompletionError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_stream_call_yields_payloads_until_done() {
    let server = MockServer::start_async().await;
    let sse_body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
    );

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body_partial(r#"{"stream": true}"#);
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(sse_body);
        })
        .await;

    let provider = create_provider(&server);
    let stream = provider.stream_call(params()).await.expect("stream opens");

    let payloads: Vec<String> = timeout(
        Duration::from_secs(10),
        stream.map(|item| item.expect("chunk").data).collect::<Vec<_>>(),
    )
    .await
    .expect("stream should finish");

    mock.assert_async().await;
    assert_eq!(
        payloads,
        vec![
            r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
            ": keep-alive",
            r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
        ]
    );
}

#[tokio::test]
async fn test_unreachable_provider_is_transport_error() {
    // port 9 (discard) is almost never listening
    let credential = ProviderCredential::new("http://127.0.0.1:9/v1", "sk-test-key");
    let provider = OpenAiCompatibleProvider::new(Arc::new(credential)).unwrap();

    let err = provider.call_sync(params()).await.unwrap_err();
    assert!(matches!(err, CompletionError::Transport(_)));
}
