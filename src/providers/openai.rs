//! OpenAI chat completions adapter.
//!
//! Maps the generic request onto `POST /v1/chat/completions`. OpenAI
//! reports quota in `x-ratelimit-*` headers with a duration-style reset
//! (`"1s"`, `"250ms"`); only the simple forms are parsed, anything else
//! means no signal.

use crate::engine::types::{GenerationRequest, RateLimitWindow, TokenUsage};
use crate::providers::adapter::{bounded, classify_status, user_content, ProviderAdapter};
use crate::providers::types::{ProviderError, ProviderReply};
use chrono::Utc;
use futures::future::BoxFuture;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER_NAME: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const REMAINING_HEADER: &str = "x-ratelimit-remaining-requests";
const RESET_HEADER: &str = "x-ratelimit-reset-requests";

pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiAdapter {
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
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": user_content(&request) }));

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
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

impl ProviderAdapter for OpenAiAdapter {
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
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

/// Parse a raw response body into a reply. A null `content` (tool-call
/// turns, filtered output) is unusable for this engine and is rejected
/// rather than coerced into an empty reply.
pub(crate) fn extract_reply(
    payload: &str,
    rate_limit: Option<RateLimitWindow>,
) -> Result<ProviderReply, ProviderError> {
    let parsed: ChatResponse = serde_json::from_str(payload)
        .map_err(|e| ProviderError::MalformedResponse(format!("undecodable body: {}", e)))?;

    let Some(choice) = parsed.choices.into_iter().next() else {
        return Err(ProviderError::MalformedResponse(
            "response contained no choices".to_string(),
        ));
    };

    let Some(content) = choice.message.content.filter(|c| !c.is_empty()) else {
        return Err(ProviderError::MalformedResponse(
            "choice carried no text content".to_string(),
        ));
    };

    let usage = parsed.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(ProviderReply {
        content,
        model: parsed.model,
        usage,
        finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
        rate_limit,
    })
}

pub(crate) fn parse_rate_limit_headers(headers: &HeaderMap) -> Option<RateLimitWindow> {
    let remaining: u64 = headers
        .get(REMAINING_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    let reset_in = headers
        .get(RESET_HEADER)?
        .to_str()
        .ok()
        .and_then(parse_reset_duration)?;

    Some(RateLimitWindow {
        remaining,
        reset_at: Utc::now() + chrono::Duration::from_std(reset_in).unwrap_or_default(),
    })
}

/// OpenAI encodes the reset as `"420ms"` or `"1.2s"`. Compound forms
/// like `"6m12s"` are rare for request windows and are ignored.
pub(crate) fn parse_reset_duration(raw: &str) -> Option<Duration> {
    // A day is far beyond any real request window; also rejects the
    // non-finite values from_secs_f64 would panic on.
    const MAX_RESET_SECS: f64 = 86_400.0;

    if let Some(millis) = raw.strip_suffix("ms") {
        return millis
            .parse::<f64>()
            .ok()
            .filter(|v| (0.0..=MAX_RESET_SECS * 1000.0).contains(v))
            .map(|v| Duration::from_millis(v as u64));
    }
    if let Some(secs) = raw.strip_suffix('s') {
        return secs
            .parse::<f64>()
            .ok()
            .filter(|v| (0.0..=MAX_RESET_SECS).contains(v))
            .map(Duration::from_secs_f64);
    }
    None
}
