//! The generation pipeline coordinator.
//!
//! `generate` is the engine's whole public surface: cache lookup,
//! priority-ordered provider attempts gated by the health tracker, and
//! the demo fallback when everything else is skipped or fails. Provider
//! failures never reach the caller; the only surfaced error is an
//! invalid request.
//!
//! Calls are independent and may run concurrently; dropping the returned
//! future cancels the in-flight provider call (the HTTP transports are
//! cancel-safe) and no compensating action is needed.

use crate::engine::cache::{fingerprint, ResponseCache};
use crate::engine::demo::DemoResponder;
use crate::engine::health::ProviderHealthTracker;
use crate::engine::metrics::{MetricsAccumulator, RequestOutcome};
use crate::engine::types::{EngineConfig, EngineError, GenerationRequest, GenerationResult};
use crate::providers::adapter::ProviderDescriptor;
use crate::providers::types::ProviderError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct ResponseOrchestrator {
    /// Sorted ascending by priority at construction, read-only after.
    providers: Vec<ProviderDescriptor>,
    health: Arc<ProviderHealthTracker>,
    cache: Arc<dyn ResponseCache>,
    demo: DemoResponder,
    metrics: Arc<MetricsAccumulator>,
    config: EngineConfig,
}

impl ResponseOrchestrator {
    /// Build the orchestrator once at startup from explicit parts. No
    /// lazy globals; tests inject fake adapters and an empty cache the
    /// same way production injects real ones.
    pub fn new(
        mut providers: Vec<ProviderDescriptor>,
        cache: Arc<dyn ResponseCache>,
        config: EngineConfig,
    ) -> Self {
        providers.sort_by_key(|d| d.priority);

        let health = Arc::new(ProviderHealthTracker::new(
            providers.iter().map(|d| d.name.clone()),
            config.health.clone(),
        ));

        Self {
            providers,
            health,
            cache,
            demo: DemoResponder::new(),
            metrics: Arc::new(MetricsAccumulator::new()),
            config,
        }
    }

    pub fn health(&self) -> &ProviderHealthTracker {
        &self.health
    }

    pub fn metrics(&self) -> &MetricsAccumulator {
        &self.metrics
    }

    /// Names of providers currently in the rotation, in attempt order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|d| d.name.clone()).collect()
    }

    /// Generate a reply for the request.
    ///
    /// Always returns a result for valid input; when no provider is
    /// usable the demo responder resolves the call. Side effects per
    /// call: one cache read, at most one cache write, exactly one
    /// metrics update.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResult, EngineError> {
        request.validate()?;

        let started = Instant::now();
        let key = fingerprint(
            &request.persona_id,
            request.context.as_deref(),
            &request.prompt,
        );

        if let Some(cached) = self.cache.get(&key).await {
            debug!("Request {} served from cache", request.id);
            self.metrics
                .record_request(RequestOutcome::CacheHit, started.elapsed())
                .await;
            return Ok(cached);
        }

        for descriptor in &self.providers {
            if !self.health.may_attempt(&descriptor.name).await {
                debug!(
                    "Provider '{}' excluded by health state, skipping",
                    descriptor.name
                );
                continue;
            }

            debug!(
                "Request {} attempting provider '{}'",
                request.id, descriptor.name
            );

            match descriptor
                .adapter
                .complete(request.clone(), self.config.request_timeout)
                .await
            {
                Ok(reply) => {
                    if let Some(window) = reply.rate_limit {
                        self.health
                            .record_rate_limit(&descriptor.name, window.remaining, window.reset_at)
                            .await;
                    }
                    self.health.record_success(&descriptor.name).await;

                    let result = GenerationResult {
                        content: reply.content,
                        provider_name: descriptor.name.clone(),
                        model_name: reply.model,
                        usage: reply.usage,
                        finish_reason: reply.finish_reason,
                    };

                    self.cache
                        .put(&key, result.clone(), self.config.cache_ttl)
                        .await;
                    self.metrics
                        .record_request(
                            RequestOutcome::Provider(&descriptor.name),
                            started.elapsed(),
                        )
                        .await;

                    info!(
                        "Request {} served by provider '{}' in {:?}",
                        request.id,
                        descriptor.name,
                        started.elapsed()
                    );
                    return Ok(result);
                }
                Err(error) => {
                    self.record_provider_failure(&descriptor.name, &error).await;
                }
            }
        }

        // Exhaustion is not an error: synthesize a reply. Demo output is
        // never cached so the next call retries live providers.
        let result = self.demo.respond(&request);
        self.metrics
            .record_request(RequestOutcome::Demo, started.elapsed())
            .await;
        info!(
            "Request {} served by demo responder, no provider was usable",
            request.id
        );
        Ok(result)
    }

    async fn record_provider_failure(&self, name: &str, error: &ProviderError) {
        // A 429 is both a failed attempt and a quota signal. The window
        // is what actually excludes the provider; absent a reset hint we
        // fall back to the circuit cool-down.
        if let ProviderError::RateLimited { reset_at, .. } = error {
            let reset = reset_at.unwrap_or_else(|| {
                Utc::now()
                    + chrono::Duration::from_std(self.config.health.circuit_cooldown)
                        .unwrap_or_default()
            });
            self.health.record_rate_limit(name, 0, reset).await;
        }

        match error {
            ProviderError::MalformedResponse(detail) => {
                // Logged distinctly: this smells like vendor contract
                // drift rather than an outage.
                warn!(
                    "Provider '{}' returned a response we could not use: {}",
                    name, detail
                );
            }
            _ => {
                warn!(
                    "Provider '{}' call failed (transient: {}): {}",
                    name,
                    error.is_transient(),
                    error
                );
            }
        }

        self.health.record_failure(name).await;
    }
}
