//! Google Gemini generateContent adapter.
//!
//! Maps the generic request onto
//! `POST /v1beta/models/{model}:generateContent`. Gemini does not expose
//! quota headers, so this adapter never produces a rate-limit snapshot;
//! 429 responses still classify as rate-limited without a reset hint.

use crate::engine::types::{GenerationRequest, TokenUsage};
use crate::providers::adapter::{bounded, classify_status, user_content, ProviderAdapter};
use crate::providers::types::{ProviderError, ProviderReply};
use futures::future::BoxFuture;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER_NAME: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiAdapter {
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
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": user_content(&request) }],
            }],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            },
        });
        if let Some(system) = &request.system_prompt {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
        }

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let payload = response.text().await.unwrap_or_default();

        if !(200..300).contains(&status) {
            return Err(classify_status(status, payload, None));
        }

        extract_reply(&payload, &self.model)
    }
}

impl ProviderAdapter for GeminiAdapter {
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
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

/// Parse a raw response body into a reply. Safety-blocked generations
/// come back with no candidates or no parts; both are unusable.
pub(crate) fn extract_reply(payload: &str, model: &str) -> Result<ProviderReply, ProviderError> {
    let parsed: GenerateContentResponse = serde_json::from_str(payload)
        .map_err(|e| ProviderError::MalformedResponse(format!("undecodable body: {}", e)))?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        return Err(ProviderError::MalformedResponse(
            "response contained no candidates".to_string(),
        ));
    };

    let content: String = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if content.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "candidate carried no text parts".to_string(),
        ));
    }

    let usage = parsed
        .usage_metadata
        .map_or_else(TokenUsage::default, |u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

    Ok(ProviderReply {
        content,
        model: parsed.model_version.unwrap_or_else(|| model.to_string()),
        usage,
        finish_reason: candidate
            .finish_reason
            .map(|r| r.to_lowercase())
            .unwrap_or_else(|| "stop".to_string()),
        rate_limit: None,
    })
}
