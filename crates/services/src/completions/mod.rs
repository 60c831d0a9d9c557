pub mod normalizer;
pub mod ports;
pub mod relay;

use futures_util::StreamExt;
use inference_providers::{AssistantProvider, ChatCompletionParams, InferenceProvider};
use std::sync::Arc;

pub use normalizer::{normalize, ProviderFailure};
pub use ports::{
    CompletionServiceTrait, DeliveryMode, Dispatched, DomainError, DomainErrorKind, RelayFrame,
    RelayStream, TextStream,
};
pub use relay::relay;

pub struct CompletionServiceImpl {
    pub provider: Arc<dyn InferenceProvider>,
    pub assistant: Arc<AssistantProvider>,
}

impl CompletionServiceImpl {
    pub fn new(provider: Arc<dyn InferenceProvider>, assistant: Arc<AssistantProvider>) -> Self {
        Self {
            provider,
            assistant,
        }
    }
}

#[async_trait::async_trait]
impl CompletionServiceTrait for CompletionServiceImpl {
    async fn dispatch(
        &self,
        params: ChatCompletionParams,
        mode: DeliveryMode,
    ) -> Result<Dispatched, DomainError> {
        tracing::debug!(
            provider = self.provider.name(),
            model = params.model().unwrap_or_default(),
            stream = mode.is_stream(),
            "Dispatching chat completion"
        );

        match mode {
            DeliveryMode::Sync => self
                .provider
                .call_sync(params)
                .await
                .map(Dispatched::Complete)
                .map_err(|e| normalize(&e)),
            DeliveryMode::Stream => {
                // opened by the relay on first poll, after response headers are out
                let provider = self.provider.clone();
                Ok(Dispatched::Stream(relay(async move {
                    provider.stream_call(params).await
                })))
            }
        }
    }

    async fn assistant_stream(&self, message: String) -> TextStream {
        let assistant = self.assistant.clone();
        let frames = relay(async move {
            let params = assistant.prompt(&message);
            assistant.stream_call(params).await
        });

        Box::pin(frames.filter_map(|frame| async move {
            match frame {
                RelayFrame::Data(text) => Some(Ok(text)),
                RelayFrame::Done => None,
                RelayFrame::Error(e) => Some(Err(e)),
            }
        }))
    }
}
