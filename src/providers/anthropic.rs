//! Anthropic messages API adapter.
//!
//! Maps the generic request onto `POST /v1/messages` and extracts text
//! content blocks from the reply. Anthropic reports quota in
//! `anthropic-ratelimit-requests-*` headers on both success and 429
//! responses; whatever we can parse is forwarded to the health tracker.

use crate::engine::types::{GenerationRequest, RateLimitWindow, TokenUsage};
use crate::providers::adapter::{bounded, classify_status, user_content, ProviderAdapter};
use crate::providers::types::{ProviderError, ProviderReply};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER_NAME: &str = "anthropic";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const API_VERSION: &str = "2023-06-01";

const REMAINING_HEADER: &str = "anthropic-ratelimit-requests-remaining";
const RESET_HEADER: &str = "anthropic-ratelimit-requests-reset";

pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicAdapter {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    async fn dispatch(&self, request: GenerationRequest) -> Result<ProviderReply, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [{ "role": "user", "content": user_content(&request) }],
        });
        if let Some(system) = &request.system_prompt {
            body["system"] = serde_json::json!(system);
        }

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let rate_limit = parse_rate_limit_headers(response.headers());
        let status = response.status().as_u16();
        let payload = response.text().await.unwrap_or_default();

        if !(200..300).contains(&status) {
            return Err(classify_status(
                status,
                payload,
                rate_limit.map(|w| w.reset_at),
            ));
        }

        extract_reply(&payload, rate_limit)
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn complete(
        &self,
        request: GenerationRequest,
        timeout: Duration,
    ) -> BoxFuture<'_, Result<ProviderReply, ProviderError>> {
        Box::pin(async move { bounded(timeout, self.dispatch(request)).await })
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: MessagesUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: u64,
    output_tokens: u64,
}

/// Parse a raw response body into a reply. Content blocks that are not
/// plain text (tool use, thinking, images) are not coercible here; a
/// response with no text block at all is unusable by contract.
pub(crate) fn extract_reply(
    payload: &str,
    rate_limit: Option<RateLimitWindow>,
) -> Result<ProviderReply, ProviderError> {
    let parsed: MessagesResponse = serde_json::from_str(payload)
        .map_err(|e| ProviderError::MalformedResponse(format!("undecodable body: {}", e)))?;

    let content: String = parsed
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text.as_str())
        .collect();

    if content.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "response contained no text content blocks".to_string(),
        ));
    }

    Ok(ProviderReply {
        content,
        model: parsed.model,
        usage: TokenUsage {
            prompt_tokens: parsed.usage.input_tokens,
            completion_tokens: parsed.usage.output_tokens,
            total_tokens: parsed.usage.input_tokens + parsed.usage.output_tokens,
        },
        finish_reason: parsed.stop_reason.unwrap_or_else(|| "stop".to_string()),
        rate_limit,
    })
}

/// Best-effort header parse; a malformed header simply means no signal.
pub(crate) fn parse_rate_limit_headers(headers: &HeaderMap) -> Option<RateLimitWindow> {
    let remaining: u64 = headers
        .get(REMAINING_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    let reset_at: DateTime<Utc> = headers
        .get(RESET_HEADER)?
        .to_str()
        .ok()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|t| t.with_timezone(&Utc))?;

    Some(RateLimitWindow { remaining, reset_at })
}
