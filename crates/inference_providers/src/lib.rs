//! Inference providers crate for calling an upstream chat-completion API
//!
//! This crate provides the provider client used by the gateway. A provider can be
//! called in two ways:
//!
//! - **Synchronously** via [`InferenceProvider::call_sync`], returning the provider's
//!   aggregated JSON document untouched.
//! - **Streaming** via [`InferenceProvider::stream_call`], returning a lazy, single-use
//!   stream of [`CompletionChunk`]s that ends when the provider sends its `[DONE]`
//!   sentinel or closes the connection.
//!
//! Two implementations exist and are chosen when the gateway starts:
//!
//! - [`OpenAiCompatibleProvider`] forwards the caller's body verbatim.
//! - [`AssistantProvider`] builds a fixed system + user prompt and yields only the
//!   assistant's text deltas.
//!
//! # Usage
//!
//! ```rust,ignore
//! use inference_providers::{InferenceProvider, ChatCompletionParams};
//! use futures_util::StreamExt;
//!
//! async fn example<P: InferenceProvider>(provider: P, params: ChatCompletionParams) {
//!     let mut stream = provider.stream_call(params).await?;
//!     while let Some(chunk) = stream.next().await {
//!         match chunk {
//!             Ok(chunk) => println!("payload: {}", chunk.data),
//!             Err(e) => eprintln!("stream error: {e}"),
//!         }
//!     }
//! }
//! ```

pub mod assistant;
pub mod credential;
pub mod mock;
pub mod models;
pub mod openai_compatible;
pub mod sse_parser;

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

// Re-export commonly used types for convenience
pub use assistant::AssistantProvider;
pub use credential::ProviderCredential;
pub use mock::MockProvider;
pub use models::{
    ChatCompletionParams, ChatMessage, CompletionChunk, CompletionError, CompletionResult,
    MessageRole,
};
pub use openai_compatible::OpenAiCompatibleProvider;

/// Type alias for streaming completion results
///
/// Items arrive in the provider's order. The stream ends after the provider's end
/// sentinel or connection close; an `Err` item is always the last item.
pub type StreamingResult =
    Pin<Box<dyn Stream<Item = Result<CompletionChunk, CompletionError>> + Send>>;

#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Identifier of the implementation, used in logs
    fn name(&self) -> &'static str;

    /// Performs one non-streaming chat completion request
    ///
    /// The stream flag is forced to `false` before the request is sent. The returned
    /// [`CompletionResult`] carries the provider's bytes exactly as received.
    async fn call_sync(
        &self,
        params: ChatCompletionParams,
    ) -> Result<CompletionResult, CompletionError>;

    /// Opens one streaming chat completion request
    ///
    /// The stream flag is forced to `true`. The upstream connection is owned by the
    /// returned stream and released when the stream is dropped.
    async fn stream_call(
        &self,
        params: ChatCompletionParams,
    ) -> Result<StreamingResult, CompletionError>;
}
