//! The provider capability trait and the startup factory.
//!
//! Each adapter owns its vendor's request/response mapping so the
//! orchestrator's control flow stays vendor-agnostic: it sees one
//! `complete` operation that either yields a usable reply or a
//! classified [`ProviderError`].

use crate::engine::types::GenerationRequest;
use crate::providers::anthropic::AnthropicAdapter;
use crate::providers::gemini::GeminiAdapter;
use crate::providers::openai::OpenAiAdapter;
use crate::providers::types::{ProviderError, ProviderKind, ProviderReply, ProviderSettings};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Uniform interface over one external completion service.
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider identifier, also used as the health-tracker key
    /// and the `provider_name` stamped on results.
    fn name(&self) -> &'static str;

    /// Execute one completion bounded by `timeout`. A response the
    /// adapter cannot interpret as usable text must surface as
    /// [`ProviderError::MalformedResponse`], never as a coerced success.
    fn complete(
        &self,
        request: GenerationRequest,
        timeout: Duration,
    ) -> BoxFuture<'_, Result<ProviderReply, ProviderError>>;
}

/// One configured provider in the rotation: identity, ordering, and the
/// adapter that does the work. Built once at startup, read-only after.
#[derive(Clone)]
pub struct ProviderDescriptor {
    pub name: String,
    pub priority: i32,
    pub adapter: Arc<dyn ProviderAdapter>,
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Build the descriptor list from configuration. Providers without a
/// resolvable API key or with an unparseable base URL are dropped here,
/// with a warning, so the rotation only ever contains callable entries.
pub fn build_providers(
    settings: Vec<ProviderSettings>,
    client: reqwest::Client,
) -> Vec<ProviderDescriptor> {
    let mut descriptors = Vec::with_capacity(settings.len());

    for spec in settings {
        let Some(api_key) = spec.api_key.clone().filter(|k| !k.trim().is_empty()) else {
            warn!(
                "No API key configured for provider '{}', omitting it from the rotation",
                spec.kind.name()
            );
            continue;
        };

        if let Some(raw) = spec.base_url.as_deref()
            && Url::parse(raw).is_err()
        {
            warn!(
                "Invalid base URL '{}' for provider '{}', omitting it from the rotation",
                raw,
                spec.kind.name()
            );
            continue;
        }

        let adapter: Arc<dyn ProviderAdapter> = match spec.kind {
            ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(
                client.clone(),
                api_key,
                spec.base_url,
                spec.model,
            )),
            ProviderKind::OpenAi => Arc::new(OpenAiAdapter::new(
                client.clone(),
                api_key,
                spec.base_url,
                spec.model,
            )),
            ProviderKind::Gemini => Arc::new(GeminiAdapter::new(
                client.clone(),
                api_key,
                spec.base_url,
                spec.model,
            )),
        };

        descriptors.push(ProviderDescriptor {
            name: adapter.name().to_string(),
            priority: spec.priority,
            adapter,
        });
    }

    // Lower priority first; sort is stable so ties keep config order.
    descriptors.sort_by_key(|d| d.priority);
    descriptors
}

/// Bound a vendor call. Timeouts are indistinguishable from transport
/// failures for fallback purposes.
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}

/// Fold the optional prior context into the user turn. Vendors all take
/// a single user message for this engine's one-shot requests.
pub(crate) fn user_content(request: &GenerationRequest) -> String {
    match request.context.as_deref() {
        Some(context) if !context.trim().is_empty() => {
            format!("{}\n\n{}", context.trim(), request.prompt)
        }
        _ => request.prompt.clone(),
    }
}

/// Shared non-2xx classification. `reset_at` comes from vendor rate
/// headers when the caller managed to parse them.
pub(crate) fn classify_status(
    status: u16,
    message: String,
    reset_at: Option<chrono::DateTime<chrono::Utc>>,
) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Authentication(message),
        429 => ProviderError::RateLimited { message, reset_at },
        _ => ProviderError::Api { status, message },
    }
}
