use async_trait::async_trait;
use futures_util::Stream;
use inference_providers::{ChatCompletionParams, CompletionResult};
use std::pin::Pin;

/// Provider-independent category of a failed completion call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainErrorKind {
    Auth,
    Permission,
    Billing,
    Quota,
    BadRequest,
    UpstreamUnavailable,
    UnknownProvider,
    Internal,
}

impl DomainErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainErrorKind::Auth => "auth_error",
            DomainErrorKind::Permission => "permission_error",
            DomainErrorKind::Billing => "billing_error",
            DomainErrorKind::Quota => "quota_error",
            DomainErrorKind::BadRequest => "bad_request_error",
            DomainErrorKind::UpstreamUnavailable => "upstream_unavailable_error",
            DomainErrorKind::UnknownProvider => "unknown_provider_error",
            DomainErrorKind::Internal => "internal_error",
        }
    }
}

impl std::fmt::Display for DomainErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized completion failure, ready for the boundary layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DomainError {
    pub kind: DomainErrorKind,
    pub message: String,
    /// Seconds the caller should wait before retrying
    pub retry_after: Option<u64>,
}

impl DomainError {
    pub fn new(kind: DomainErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Option<u64>) -> Self {
        self.retry_after = retry_after;
        self
    }
}

/// How the caller wants the completion delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Sync,
    Stream,
}

impl DeliveryMode {
    /// Combine the two out-of-band stream signals
    ///
    /// Either signal alone selects streaming. When they disagree the stream request
    /// wins simply because the signals are OR-ed; there is no precedence between them.
    pub fn from_signals(stream_query: bool, accepts_event_stream: bool) -> Self {
        if stream_query || accepts_event_stream {
            DeliveryMode::Stream
        } else {
            DeliveryMode::Sync
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, DeliveryMode::Stream)
    }
}

/// One outbound frame of a relayed stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFrame {
    /// Raw provider payload
    Data(String),
    /// Successful end of the stream
    Done,
    /// Failed end of the stream
    Error(DomainError),
}

impl RelayFrame {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RelayFrame::Data(_))
    }
}

/// Lazy frame sequence. The last item is always `Done` or `Error`.
pub type RelayStream = Pin<Box<dyn Stream<Item = RelayFrame> + Send>>;

/// Lazy sequence of assistant text fragments
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

pub enum Dispatched {
    Complete(CompletionResult),
    Stream(RelayStream),
}

impl std::fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatched::Complete(result) => f.debug_tuple("Complete").field(result).finish(),
            Dispatched::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[async_trait]
pub trait CompletionServiceTrait: Send + Sync {
    /// Run one chat completion in the given delivery mode
    ///
    /// Sync mode either returns the provider's document or a normalized error.
    /// Stream mode always succeeds; failures arrive as the stream's terminal frame.
    async fn dispatch(
        &self,
        params: ChatCompletionParams,
        mode: DeliveryMode,
    ) -> Result<Dispatched, DomainError>;

    /// Stream the assistant's answer to a single free-text message
    async fn assistant_stream(&self, message: String) -> TextStream;
}
