use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A message the gateway writes itself, for the assistant prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

impl From<ChatMessage> for Value {
    fn from(message: ChatMessage) -> Self {
        let mut object = Map::new();
        object.insert("role".to_string(), message.role.as_str().into());
        object.insert("content".to_string(), Value::String(message.content));
        Value::Object(object)
    }
}

/// Body of a chat completion request, kept as the caller's JSON object
///
/// Nothing is validated or normalized: unknown roles, extra fields and any numeric
/// shape are forwarded as received. The gateway only ever writes `stream`. The
/// accessors below are read-only views used for routing and logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatCompletionParams {
    body: Map<String, Value>,
}

impl ChatCompletionParams {
    pub fn from_body(body: Map<String, Value>) -> Self {
        Self { body }
    }

    /// Body for a gateway-built prompt
    pub fn from_messages(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        let mut body = Map::new();
        body.insert("model".to_string(), Value::String(model.into()));
        body.insert(
            "messages".to_string(),
            Value::Array(messages.into_iter().map(Value::from).collect()),
        );
        Self { body }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.body
            .insert("temperature".to_string(), Value::from(temperature));
        self
    }

    /// Copy of this body with the stream flag forced
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.body.insert("stream".to_string(), Value::Bool(stream));
        self
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_body(self) -> Map<String, Value> {
        self.body
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// `model`, when the caller sent it as a string
    pub fn model(&self) -> Option<&str> {
        self.body.get("model").and_then(Value::as_str)
    }

    pub fn stream(&self) -> Option<bool> {
        self.body.get("stream").and_then(Value::as_bool)
    }

    /// `messages`, or an empty slice when absent or not an array
    pub fn messages(&self) -> &[Value] {
        self.body
            .get("messages")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// String content of the message at `index`
    pub fn message_text(&self, index: usize) -> Option<&str> {
        self.messages()
            .get(index)
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
    }

    /// String content of the last message with role `user`
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages()
            .iter()
            .rev()
            .find(|m| m.get("role").and_then(Value::as_str) == Some("user"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
    }
}

/// One incremental fragment of a streaming completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionChunk {
    /// Raw payload, without the `data:` marker
    pub data: String,
}

impl CompletionChunk {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Aggregated response of a non-streaming call
///
/// `raw_bytes` is what the provider sent; `response` is the same document parsed,
/// kept for inspection only.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub response: serde_json::Value,
    pub raw_bytes: Bytes,
}

#[derive(Debug, Error, Clone)]
pub enum CompletionError {
    /// Non-2xx response from the provider
    #[error("HTTP {status_code} from provider: {body}")]
    HttpError {
        status_code: u16,
        body: String,
        /// Seconds from the `Retry-After` header, when present
        retry_after: Option<u64>,
    },

    /// Error object sent by the provider inside a successful stream
    #[error("Provider reported an error: {body}")]
    ProviderError { body: String },

    /// Connection, timeout or body read failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// 2xx response whose body could not be understood
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// The request could not be built from the gateway's own configuration
    #[error("Provider client misconfigured: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::Transport(format!("request timed out: {e}"))
        } else {
            CompletionError::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_kept_as_sent() {
        let body = serde_json::json!({
            "model": "",
            "messages": [
                {"role": "ipython", "content": "out", "tool_call_id": "t1"},
                {"role": "user", "content": [{"type": "text", "text": "hi"}], "name": "alice"}
            ],
            "max_tokens": 12.5,
            "stream": true,
            "logit_bias": {"50256": -100}
        });

        let params: ChatCompletionParams = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(params.model(), Some(""));
        assert_eq!(params.messages().len(), 2);
        assert_eq!(params.message_text(0), Some("out"));
        assert_eq!(params.message_text(1), None);

        let mut expected = body;
        expected["stream"] = serde_json::json!(false);
        assert_eq!(serde_json::to_value(params.with_stream(false)).unwrap(), expected);
    }

    #[test]
    fn test_only_stream_is_added() {
        let params: ChatCompletionParams =
            serde_json::from_value(serde_json::json!({"messages": []})).unwrap();
        let forwarded = serde_json::to_value(params.with_stream(true)).unwrap();

        assert_eq!(forwarded, serde_json::json!({"messages": [], "stream": true}));
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        assert!(serde_json::from_str::<ChatCompletionParams>("[1, 2]").is_err());
    }

    #[test]
    fn test_gateway_built_prompt() {
        let params = ChatCompletionParams::from_messages(
            "qwen-plus",
            vec![ChatMessage::system("be brief"), ChatMessage::user("first")],
        )
        .with_temperature(0.7);

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            serde_json::json!({
                "model": "qwen-plus",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "first"}
                ],
                "temperature": 0.7
            })
        );
        assert_eq!(params.last_user_text(), Some("first"));
    }

    #[test]
    fn test_http_error_display_contains_body() {
        let err = CompletionError::HttpError {
            status_code: 429,
            body: r#"{"error":{"type":"rate_limit_exceeded"}}"#.to_string(),
            retry_after: Some(3),
        };
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("rate_limit_exceeded"));
    }
}
