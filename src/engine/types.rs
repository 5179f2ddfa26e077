use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A single generation request handed to the orchestrator.
///
/// The caller constructs the finished prompt (persona attributes, feed
/// context, etc. are resolved upstream); the engine only routes it to a
/// provider and returns the reply. The request is immutable once built
/// and is not retained by the engine beyond the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub id: Uuid,
    pub persona_id: String,
    pub prompt: String,
    pub context: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Validate caller input. These are the only failures the engine
    /// surfaces; everything downstream degrades instead of erroring.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.prompt.trim().is_empty() {
            return Err(EngineError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(EngineError::InvalidRequest(
                "max_tokens must be positive".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(EngineError::InvalidRequest(format!(
                "temperature {} is outside the supported range [0, 2]",
                self.temperature
            )));
        }
        Ok(())
    }
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            persona_id: String::new(),
            prompt: String::new(),
            context: None,
            system_prompt: None,
            temperature: 0.7,
            max_tokens: 512,
        }
    }
}

/// The normalized result returned to the caller, regardless of which
/// provider (or the demo fallback) produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: String,
    pub provider_name: String,
    pub model_name: String,
    pub usage: TokenUsage,
    pub finish_reason: String,
}

/// Token accounting as reported by the provider (or synthesized by the
/// demo responder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Engine tunables. All thresholds and windows live here so no call site
/// carries its own magic numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub health: HealthConfig,
    /// How long a successful generation stays in the response cache.
    pub cache_ttl: Duration,
    /// Upper bound on a single provider call, timeout counts as a
    /// transport failure.
    pub request_timeout: Duration,
}

/// Circuit-breaker tunables consumed by the health tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long an open circuit blocks attempts.
    pub circuit_cooldown: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            health: HealthConfig::default(),
            cache_ttl: Duration::from_secs(3600), // 1 hour
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            circuit_cooldown: Duration::from_secs(60),
        }
    }
}

/// Errors that cross the engine's public boundary.
///
/// Provider-level failures never appear here; they are absorbed by the
/// fallback chain and, at worst, resolved by the demo responder.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// A provider-reported quota window. `remaining == 0` before `reset_at`
/// excludes the provider from selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}
