//! Mock implementation of InferenceProvider for testing
//!
//! This module provides a scripted provider that behaves like a real upstream
//! without network access: canned sync documents, scripted stream steps, injected
//! failures, and a counter of upstream connections that are still open.

use crate::{
    ChatCompletionParams, CompletionChunk, CompletionError, CompletionResult, InferenceProvider,
    StreamingResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::{Mutex, RwLock};

/// One scripted step of a mock stream
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Emit a chunk with this raw payload
    Chunk(String),
    /// Fail the stream with this error; nothing after it is emitted
    Fail(CompletionError),
    /// Stall forever, like an upstream that stopped sending
    Hang,
}

/// OpenAI-style chat chunk payload carrying `content` as its delta
pub fn chat_chunk_payload(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": "mock-model",
        "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
    })
    .to_string()
}

/// Default non-streaming document returned by the mock
pub fn default_sync_response() -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "mock-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Hello from mock"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
    })
}

/// Decrements the open-connection counter when the owning stream is dropped
struct ConnectionGuard {
    open: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    fn acquire(open: Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self { open }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockProvider {
    sync_response: RwLock<Bytes>,
    stream_steps: RwLock<Vec<MockStep>>,
    /// Fails the call before any connection is "opened", for both modes
    error_override: RwLock<Option<CompletionError>>,
    captured: Mutex<Vec<ChatCompletionParams>>,
    open_streams: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            sync_response: RwLock::new(Bytes::from(default_sync_response().to_string())),
            stream_steps: RwLock::new(
                ["Hello", " from", " mock"]
                    .iter()
                    .map(|word| MockStep::Chunk(chat_chunk_payload(word)))
                    .collect(),
            ),
            error_override: RwLock::new(None),
            captured: Mutex::new(Vec::new()),
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the exact bytes returned by `call_sync`
    pub async fn set_sync_response(&self, raw: impl Into<Bytes>) {
        *self.sync_response.write().await = raw.into();
    }

    pub async fn set_stream_steps(&self, steps: Vec<MockStep>) {
        *self.stream_steps.write().await = steps;
    }

    pub async fn set_error_override(&self, error: Option<CompletionError>) {
        *self.error_override.write().await = error;
    }

    /// Parameters of every call so far, as the provider would have sent them
    pub async fn captured_params(&self) -> Vec<ChatCompletionParams> {
        self.captured.lock().await.clone()
    }

    /// Streams handed out and not yet dropped
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    async fn record(&self, params: ChatCompletionParams) -> Result<(), CompletionError> {
        self.captured.lock().await.push(params);
        match self.error_override.read().await.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn call_sync(
        &self,
        params: ChatCompletionParams,
    ) -> Result<CompletionResult, CompletionError> {
        self.record(params.with_stream(false)).await?;

        let raw_bytes = self.sync_response.read().await.clone();
        let response = serde_json::from_slice(&raw_bytes).map_err(|e| {
            CompletionError::InvalidResponse(format!("Provider response is not JSON: {e}"))
        })?;

        Ok(CompletionResult {
            response,
            raw_bytes,
        })
    }

    async fn stream_call(
        &self,
        params: ChatCompletionParams,
    ) -> Result<StreamingResult, CompletionError> {
        self.record(params.with_stream(true)).await?;

        let steps = self.stream_steps.read().await.clone();
        let guard = ConnectionGuard::acquire(self.open_streams.clone());

        Ok(Box::pin(async_stream::stream! {
            let _guard = guard;
            for step in steps {
                match step {
                    MockStep::Chunk(data) => {
                        yield Ok(CompletionChunk::new(data));
                        tokio::task::yield_now().await;
                    }
                    MockStep::Fail(e) => {
                        yield Err(e);
                        break;
                    }
                    MockStep::Hang => {
                        std::future::pending::<()>().await;
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_default_stream() {
        let mock = MockProvider::new();
        let stream = mock
            .stream_call(ChatCompletionParams::default())
            .await
            .unwrap();
        assert_eq!(mock.open_streams(), 1);

        let chunks: Vec<_> = stream.collect().await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(mock.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_connection() {
        let mock = MockProvider::new();
        mock.set_stream_steps(vec![MockStep::Chunk("a".to_string()), MockStep::Hang])
            .await;

        let mut stream = mock
            .stream_call(ChatCompletionParams::default())
            .await
            .unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap().data, "a");
        assert_eq!(mock.open_streams(), 1);

        drop(stream);
        assert_eq!(mock.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_error_override_applies_to_both_modes() {
        let mock = MockProvider::new();
        mock.set_error_override(Some(CompletionError::Transport("refused".to_string())))
            .await;

        assert!(mock.call_sync(ChatCompletionParams::default()).await.is_err());
        assert!(mock
            .stream_call(ChatCompletionParams::default())
            .await
            .is_err());
        assert_eq!(mock.open_streams(), 0);
        assert_eq!(mock.captured_params().await.len(), 2);
    }
}
