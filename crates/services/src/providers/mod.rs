//! Provider catalog reported by the admin surface

use serde::Serialize;

/// Providers the gateway knows how to name, as `(id, display name)`
const KNOWN_PROVIDERS: [(&str, &str); 2] = [("openai", "OpenAI"), ("anthropic", "Anthropic")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    /// Configured and used for completions
    Available,
    /// Known but not configured in this process
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub status: ProviderStatus,
}

/// List the configured provider first, then every other known provider
pub fn list_providers(configured: &str) -> Vec<ProviderInfo> {
    let mut providers = Vec::with_capacity(KNOWN_PROVIDERS.len() + 1);

    if !KNOWN_PROVIDERS.iter().any(|(id, _)| *id == configured) {
        providers.push(ProviderInfo {
            id: configured.to_string(),
            name: configured.to_string(),
            status: ProviderStatus::Available,
        });
    }

    providers.extend(KNOWN_PROVIDERS.iter().map(|(id, name)| ProviderInfo {
        id: id.to_string(),
        name: name.to_string(),
        status: if *id == configured {
            ProviderStatus::Available
        } else {
            ProviderStatus::Unknown
        },
    }));

    providers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listing() {
        let providers = list_providers("openai");
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].id, "openai");
        assert_eq!(providers[0].status, ProviderStatus::Available);
        assert_eq!(providers[1].id, "anthropic");
        assert_eq!(providers[1].status, ProviderStatus::Unknown);
    }

    #[test]
    fn test_custom_provider_is_listed_first() {
        let providers = list_providers("dashscope");
        assert_eq!(providers.len(), 3);
        assert_eq!(providers[0].id, "dashscope");
        assert_eq!(providers[0].status, ProviderStatus::Available);
        assert!(providers[1..]
            .iter()
            .all(|p| p.status == ProviderStatus::Unknown));
        assert_eq!(
            serde_json::to_value(&providers[1]).unwrap(),
            serde_json::json!({"id": "openai", "name": "OpenAI", "status": "unknown"})
        );
    }
}
