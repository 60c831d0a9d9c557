use std::time::Duration;

/// Connection settings for the upstream provider
///
/// Built once at startup and shared behind an `Arc` by every client.
#[derive(Debug, Clone)]
pub struct ProviderCredential {
    /// Base URL for the provider API (e.g. "https://api.openai.com/v1")
    pub base_url: String,
    /// Bearer token for authentication
    pub api_key: String,
    /// Model the assistant prompts, also used when its caller names none
    pub default_model: String,
    /// Timeout for a whole non-streaming call
    pub timeout: Duration,
    /// Timeout for a whole streaming call, including reading the body
    pub stream_timeout: Option<Duration>,
}

impl ProviderCredential {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            default_model: String::new(),
            timeout: Duration::from_secs(60),
            stream_timeout: None,
        }
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ProviderCredential {
    fn default() -> Self {
        Self::new(String::new(), String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_completions_url() {
        let providers = vec![
            (
                "https://api.openai.com/v1",
                "https://api.openai.com/v1/chat/completions",
            ),
            (
                "https://api.together.xyz/v1/",
                "https://api.together.xyz/v1/chat/completions",
            ),
            (
                "https://dashscope.aliyuncs.com/compatible-mode/v1",
                "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions",
            ),
        ];

        for (base_url, expected) in providers {
            let credential = ProviderCredential::new(base_url, "sk-test");
            assert_eq!(credential.chat_completions_url(), expected);
        }
    }
}
