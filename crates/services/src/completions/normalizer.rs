//! Classification of provider failures into [`DomainErrorKind`]s
//!
//! Rules are checked in a fixed order and the first match wins. The order matters:
//! an arrears message may come with a 401 or 403, and quota error types often come
//! with a 400.

use super::ports::{DomainError, DomainErrorKind};
use inference_providers::CompletionError;
use serde_json::Value;

const BILLING_MARKER: &str = "Arrearage";
const GOOD_STANDING_PHRASE: &str = "in good standing";
const INVALID_KEY_PHRASE: &str = "invalid api key";
const PERMISSION_TYPES: [&str; 2] = ["PermissionDenied", "permission_denied"];
const QUOTA_TYPES: [&str; 2] = ["insufficient_quota", "rate_limit_exceeded"];
const UNAVAILABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

pub const BILLING_MESSAGE: &str = "Account is in arrears or has a billing problem; access denied. Check the account status or use a valid API key.";
pub const AUTH_MESSAGE: &str =
    "Authentication failed: the API key is invalid or expired. Check the configured API key.";
pub const PERMISSION_MESSAGE: &str = "Access denied: insufficient permissions or the account is restricted. Check the account permission settings.";
pub const QUOTA_MESSAGE: &str =
    "Too many requests or quota exhausted. Retry later or raise the account quota.";
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable, retry later.";
const BAD_REQUEST_FALLBACK: &str = "check the input.";

/// Structured view of a provider failure
///
/// Every field is optional except `raw`, the failure's own text, which is what
/// remains when the provider sent nothing structured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderFailure {
    pub status: Option<u16>,
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub raw: String,
    pub retry_after: Option<u64>,
}

impl ProviderFailure {
    pub fn from_completion_error(error: &CompletionError) -> Self {
        let raw = error.to_string();
        match error {
            CompletionError::HttpError {
                status_code,
                body,
                retry_after,
            } => Self {
                status: Some(*status_code),
                retry_after: *retry_after,
                ..Self::from_body(body, raw)
            },
            CompletionError::ProviderError { body } => Self::from_body(body, raw),
            _ => Self {
                raw,
                ..Default::default()
            },
        }
    }

    /// Read `{type, code, message}` from `{"error": {...}}` or from the top level
    ///
    /// Anything that is not a JSON object yields no structured fields.
    fn from_body(body: &str, raw: String) -> Self {
        let mut failure = Self {
            raw,
            ..Default::default()
        };

        let Ok(Value::Object(root)) = serde_json::from_str::<Value>(body) else {
            return failure;
        };
        let fields = match root.get("error") {
            Some(Value::Object(inner)) => inner,
            Some(Value::String(message)) => {
                failure.message = Some(message.clone());
                return failure;
            }
            _ => &root,
        };

        failure.error_type = fields.get("type").and_then(string_field);
        failure.code = fields.get("code").and_then(string_field);
        failure.message = fields.get("message").and_then(string_field);
        failure
    }

    /// Structured message when present, else the raw failure text
    pub fn effective_message(&self) -> &str {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.raw)
    }

    fn type_is(&self, candidates: &[&str]) -> bool {
        self.error_type
            .as_deref()
            .is_some_and(|t| candidates.contains(&t))
    }

    fn status_in(&self, candidates: &[u16]) -> bool {
        self.status.is_some_and(|s| candidates.contains(&s))
    }

    pub fn classify(&self) -> DomainErrorKind {
        let message = self.effective_message();

        if self.code.as_deref() == Some(BILLING_MARKER)
            || self.type_is(&[BILLING_MARKER])
            || message.contains(GOOD_STANDING_PHRASE)
        {
            DomainErrorKind::Billing
        } else if self.status == Some(401)
            || message.to_lowercase().contains(INVALID_KEY_PHRASE)
        {
            DomainErrorKind::Auth
        } else if self.status == Some(403) || self.type_is(&PERMISSION_TYPES) {
            DomainErrorKind::Permission
        } else if self.status == Some(429) || self.type_is(&QUOTA_TYPES) {
            DomainErrorKind::Quota
        } else if self.status == Some(400) {
            DomainErrorKind::BadRequest
        } else if self.status_in(&UNAVAILABLE_STATUSES) {
            DomainErrorKind::UpstreamUnavailable
        } else {
            DomainErrorKind::UnknownProvider
        }
    }

    pub fn into_domain_error(self) -> DomainError {
        let kind = self.classify();
        let message = match kind {
            DomainErrorKind::Billing => BILLING_MESSAGE.to_string(),
            DomainErrorKind::Auth => AUTH_MESSAGE.to_string(),
            DomainErrorKind::Permission => PERMISSION_MESSAGE.to_string(),
            DomainErrorKind::Quota => QUOTA_MESSAGE.to_string(),
            DomainErrorKind::BadRequest => format!(
                "Invalid request parameters or request rejected: {}",
                self.message
                    .as_deref()
                    .filter(|m| !m.is_empty())
                    .unwrap_or(BAD_REQUEST_FALLBACK)
            ),
            DomainErrorKind::UpstreamUnavailable => UNAVAILABLE_MESSAGE.to_string(),
            DomainErrorKind::UnknownProvider | DomainErrorKind::Internal => format!(
                "Error while processing the request: {}",
                self.effective_message()
            ),
        };
        DomainError::new(kind, message).with_retry_after(self.retry_after)
    }
}

/// Strings pass through, numbers are stringified, anything else is absent
fn string_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Map any provider client failure to a domain error
///
/// Never fails. Failures of the gateway's own configuration are `Internal`; every
/// other failure goes through [`ProviderFailure::classify`].
pub fn normalize(error: &CompletionError) -> DomainError {
    if let CompletionError::Configuration(detail) = error {
        tracing::error!("Provider client misconfigured: {}", detail);
        return DomainError::new(
            DomainErrorKind::Internal,
            "Internal error while preparing the provider request.",
        );
    }

    let failure = ProviderFailure::from_completion_error(error);
    let domain_error = failure.into_domain_error();
    tracing::warn!(
        kind = %domain_error.kind,
        retry_after = ?domain_error.retry_after,
        "Provider call failed: {}",
        error
    );
    domain_error
}
