//! OpenAI-compatible provider
//!
//! Forwards the caller's chat-completion body verbatim to any provider that speaks
//! OpenAI's API format (OpenAI, Azure OpenAI, Together AI, Groq, DashScope, ...).
//! Only the stream flag and the authorization header are added.

use crate::{
    sse_parser::chunk_stream, ChatCompletionParams, CompletionError, CompletionResult,
    InferenceProvider, ProviderCredential, StreamingResult,
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
    Client, Response,
};
use std::{sync::Arc, time::Duration};

pub struct OpenAiCompatibleProvider {
    client: Client,
    credential: Arc<ProviderCredential>,
}

impl OpenAiCompatibleProvider {
    /// Build the provider and its pooled HTTP client
    pub fn new(credential: Arc<ProviderCredential>) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                CompletionError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, credential })
    }

    pub fn credential(&self) -> &ProviderCredential {
        &self.credential
    }

    fn build_headers(&self) -> Result<HeaderMap, CompletionError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = format!("Bearer {}", self.credential.api_key);
        let mut header_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| CompletionError::Configuration(format!("Invalid API key format: {e}")))?;
        header_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, header_value);

        Ok(headers)
    }

    /// Turn a non-2xx response into `HttpError`, consuming its body
    async fn check_status(response: Response) -> Result<Response, CompletionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("Failed to read error response body: {e}"));

        tracing::warn!(
            status = status.as_u16(),
            retry_after = ?retry_after,
            "Provider returned an error response"
        );

        Err(CompletionError::HttpError {
            status_code: status.as_u16(),
            body,
            retry_after,
        })
    }
}

#[async_trait]
impl InferenceProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        "openai_compatible"
    }

    async fn call_sync(
        &self,
        params: ChatCompletionParams,
    ) -> Result<CompletionResult, CompletionError> {
        let url = self.credential.chat_completions_url();
        let headers = self.build_headers()?;

        tracing::debug!(
            model = params.model().unwrap_or_default(),
            "Sending non-streaming completion request"
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .timeout(self.credential.timeout)
            .json(&params.with_stream(false))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        // Keep the provider's bytes for the caller, parse only to validate
        let raw_bytes = response.bytes().await?;
        let parsed: serde_json::Value = serde_json::from_slice(&raw_bytes).map_err(|e| {
            CompletionError::InvalidResponse(format!("Provider response is not JSON: {e}"))
        })?;

        Ok(CompletionResult {
            response: parsed,
            raw_bytes,
        })
    }

    async fn stream_call(
        &self,
        params: ChatCompletionParams,
    ) -> Result<StreamingResult, CompletionError> {
        let url = self.credential.chat_completions_url();
        let headers = self.build_headers()?;

        tracing::debug!(
            model = params.model().unwrap_or_default(),
            "Opening streaming completion request"
        );

        let mut request = self
            .client
            .post(&url)
            .headers(headers)
            .json(&params.with_stream(true));
        if let Some(ceiling) = self.credential.stream_timeout {
            request = request.timeout(ceiling);
        }

        let response = request.send().await?;
        let response = Self::check_status(response).await?;

        Ok(chunk_stream(response.bytes_stream()))
    }
}
