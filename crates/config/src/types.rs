use serde::Deserialize;
use std::{collections::HashMap, env};

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PROVIDER_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub provider: ProviderConfig,
    pub auth: AuthConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            provider: ProviderConfig::from_env()?,
            auth: AuthConfig::from_env()?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| "SERVER_PORT must be a valid port number")?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Upstream provider credential
///
/// Process-wide and read-only after startup. Every provider client built at
/// startup shares one instance of this.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider identifier reported by the admin listing (e.g. "openai")
    pub name: String,
    /// Base URL of the OpenAI-compatible API, without the `/chat/completions` suffix
    pub base_url: String,
    /// Bearer token sent upstream
    pub api_key: String,
    /// Model used by the assistant endpoint
    pub default_model: String,
    /// Ceiling for non-streaming calls
    pub timeout_seconds: u64,
    /// Ceiling for a whole streaming call; unbounded when absent
    pub stream_timeout_seconds: Option<u64>,
    /// System instruction of the assistant prompt; the built-in one when absent
    pub assistant_system_prompt: Option<String>,
}

impl ProviderConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            name: env::var("PROVIDER_NAME").unwrap_or_else(|_| "openai".to_string()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PROVIDER_BASE_URL.to_string()),
            api_key: env::var("OPENAI_API_KEY").map_err(|_| "OPENAI_API_KEY not set")?,
            default_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_PROVIDER_MODEL.to_string()),
            timeout_seconds: env::var("PROVIDER_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| "PROVIDER_TIMEOUT_SECONDS must be a valid number")?,
            stream_timeout_seconds: match env::var("PROVIDER_STREAM_TIMEOUT_SECONDS") {
                Ok(value) => Some(
                    value
                        .parse()
                        .map_err(|_| "PROVIDER_STREAM_TIMEOUT_SECONDS must be a valid number")?,
                ),
                Err(_) => None,
            },
            assistant_system_prompt: env::var("ASSISTANT_SYSTEM_PROMPT").ok(),
        })
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "openai".to_string(),
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            api_key: String::new(),
            default_model: DEFAULT_PROVIDER_MODEL.to_string(),
            timeout_seconds: 60,
            stream_timeout_seconds: None,
            assistant_system_prompt: None,
        }
    }
}

/// Logging Configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub modules: HashMap<String, String>,
}

impl LoggingConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, String> {
        let mut modules = HashMap::new();

        // Load module-specific log levels
        if let Ok(level) = env::var("LOG_MODULE_API") {
            modules.insert("api".to_string(), level);
        }
        if let Ok(level) = env::var("LOG_MODULE_SERVICES") {
            modules.insert("services".to_string(), level);
        }
        if let Ok(level) = env::var("LOG_MODULE_INFERENCE_PROVIDERS") {
            modules.insert("inference_providers".to_string(), level);
        }

        Ok(Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            modules,
        })
    }

    /// Filter directive in `tracing_subscriber::EnvFilter` syntax
    pub fn filter_directive(&self) -> String {
        let mut filter = self.level.clone();

        let mut modules: Vec<_> = self.modules.iter().collect();
        modules.sort();
        for (module, level) in modules {
            filter.push_str(&format!(",{module}={level}"));
        }

        filter
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut modules = HashMap::new();
        modules.insert("api".to_string(), "debug".to_string());
        modules.insert("services".to_string(), "debug".to_string());

        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            modules,
        }
    }
}

/// Static bearer tokens accepted by the authorization collaborator
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: Vec<AuthTokenConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokenConfig {
    pub token: String,
    pub user: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl AuthConfig {
    /// Load from environment variables
    ///
    /// `AUTH_TOKENS` has the form `token=user:cap1|cap2;token2=user2:cap3`.
    pub fn from_env() -> Result<Self, String> {
        match env::var("AUTH_TOKENS") {
            Ok(raw) => Ok(Self {
                tokens: parse_auth_tokens(&raw)?,
            }),
            Err(_) => Ok(Self::default()),
        }
    }
}

fn parse_auth_tokens(raw: &str) -> Result<Vec<AuthTokenConfig>, String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (token, rest) = entry
                .split_once('=')
                .ok_or_else(|| format!("AUTH_TOKENS entry '{entry}' is missing '='"))?;
            let (user, capabilities) = rest.split_once(':').unwrap_or((rest, ""));
            if token.trim().is_empty() || user.trim().is_empty() {
                return Err(format!("AUTH_TOKENS entry '{entry}' has an empty token or user"));
            }
            Ok(AuthTokenConfig {
                token: token.trim().to_string(),
                user: user.trim().to_string(),
                capabilities: capabilities
                    .split('|')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
            })
        })
        .collect()
}
