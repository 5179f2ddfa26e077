use crate::engine::types::{RateLimitWindow, TokenUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The closed set of supported vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }
}

/// Static per-provider configuration, as loaded from the config file.
/// A provider whose `api_key` cannot be resolved (config or environment)
/// is omitted from the rotation entirely rather than failing every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Lower is tried first. Ties keep config order.
    pub priority: i32,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// What a vendor adapter hands back on success, before the orchestrator
/// stamps the provider name on it.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: String,
    /// Quota window the vendor reported alongside the response, when the
    /// vendor sends one. Forwarded verbatim to the health tracker.
    pub rate_limit: Option<RateLimitWindow>,
}

/// Failures local to one provider attempt. None of these cross the
/// engine's public boundary; they decide logging and health bookkeeping
/// before the orchestrator moves on to the next provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        reset_at: Option<DateTime<Utc>>,
    },
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("unusable response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Transient errors suggest an outage; malformed responses suggest
    /// contract drift with the vendor. Both fall through to the next
    /// provider, the distinction only changes how we log them.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_)
            | ProviderError::Network(_)
            | ProviderError::RateLimited { .. } => true,
            ProviderError::Api { status, .. } => *status >= 500,
            ProviderError::Authentication(_) | ProviderError::MalformedResponse(_) => false,
        }
    }
}
