//! Orchestrated assistant provider
//!
//! Wraps another provider and turns a single free-text question into a fixed
//! two-message prompt. The stream it returns carries only the assistant's text
//! deltas, ready to be concatenated by the consumer.

use crate::{
    ChatCompletionParams, ChatMessage, CompletionChunk, CompletionError, CompletionResult,
    InferenceProvider, ProviderCredential, StreamingResult,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::Arc;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant that answers users' questions and helps them with their tasks. Please answer the user's questions in Chinese.";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

pub struct AssistantProvider {
    inner: Arc<dyn InferenceProvider>,
    system_prompt: String,
    default_model: String,
    temperature: f64,
}

impl AssistantProvider {
    /// Assistant over `inner`, prompting the credential's default model
    pub fn new(inner: Arc<dyn InferenceProvider>, credential: &ProviderCredential) -> Self {
        Self {
            inner,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            default_model: credential.default_model.clone(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Parameters for a single user message
    pub fn prompt(&self, message: &str) -> ChatCompletionParams {
        self.prompt_for_model(&self.default_model, message)
    }

    fn prompt_for_model(&self, model: &str, message: &str) -> ChatCompletionParams {
        ChatCompletionParams::from_messages(
            model,
            vec![
                ChatMessage::system(self.system_prompt.as_str()),
                ChatMessage::user(message),
            ],
        )
        .with_temperature(self.temperature)
    }

    /// Rebuild arbitrary parameters into the fixed prompt shape
    ///
    /// The last user message is kept as the question; every other message and
    /// sampling field is replaced.
    fn orchestrate(&self, params: ChatCompletionParams) -> ChatCompletionParams {
        let question = params.last_user_text().unwrap_or_default();
        let model = params
            .model()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model);
        self.prompt_for_model(model, question)
    }
}

/// Assistant text carried by one chat-completion chunk payload
///
/// Returns `Ok(None)` for payloads with no text (role-only deltas, usage chunks,
/// non-JSON lines) and `Err` for in-band provider error objects.
pub fn delta_text(payload: &str) -> Result<Option<String>, CompletionError> {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(payload) else {
        tracing::debug!("Skipping non-JSON stream payload");
        return Ok(None);
    };

    if json.get("error").is_some_and(|e| !e.is_null()) {
        return Err(CompletionError::ProviderError {
            body: payload.to_string(),
        });
    }

    Ok(json
        .pointer("/choices/0/delta/content")
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string))
}

#[async_trait]
impl InferenceProvider for AssistantProvider {
    fn name(&self) -> &'static str {
        "assistant"
    }

    async fn call_sync(
        &self,
        params: ChatCompletionParams,
    ) -> Result<CompletionResult, CompletionError> {
        self.inner.call_sync(self.orchestrate(params)).await
    }

    async fn stream_call(
        &self,
        params: ChatCompletionParams,
    ) -> Result<StreamingResult, CompletionError> {
        let upstream = self.inner.stream_call(self.orchestrate(params)).await?;

        let texts = upstream.filter_map(|item| async move {
            match item {
                Ok(chunk) => match delta_text(&chunk.data) {
                    Ok(Some(text)) => Some(Ok(CompletionChunk::new(text))),
                    Ok(None) => None,
                    Err(e) => Some(Err(e)),
                },
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(texts))
    }
}
