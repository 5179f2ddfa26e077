//! Per-provider circuit-breaker and rate-limit bookkeeping.
//!
//! This is the single source of truth for "may we call this provider
//! right now". The orchestrator consults [`ProviderHealthTracker::may_attempt`]
//! before every adapter call and reports every outcome back; adapters
//! never touch health state directly.

use crate::engine::types::{HealthConfig, RateLimitWindow};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Mutable health record for one provider. Exclusively owned by the
/// tracker; each record sits behind its own mutex so concurrent
/// `generate` calls serialize per provider, not globally.
#[derive(Debug, Default, Clone)]
struct ProviderHealth {
    consecutive_failures: u32,
    circuit_open_until: Option<DateTime<Utc>>,
    rate_limit: Option<RateLimitWindow>,
}

/// External classification of a provider's current state, for
/// dashboards and the `providers` CLI subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open { until: DateTime<Utc> },
    RateLimited { reset_at: DateTime<Utc> },
}

/// Snapshot of one provider's health, produced by [`ProviderHealthTracker::status`].
#[derive(Debug, Clone)]
pub struct ProviderHealthStatus {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub remaining_quota: Option<u64>,
}

#[derive(Debug)]
pub struct ProviderHealthTracker {
    config: HealthConfig,
    providers: HashMap<String, Mutex<ProviderHealth>>,
}

impl ProviderHealthTracker {
    /// The provider set is fixed at construction; the map itself is
    /// never mutated afterwards, only the records behind the mutexes.
    pub fn new(provider_names: impl IntoIterator<Item = String>, config: HealthConfig) -> Self {
        let providers = provider_names
            .into_iter()
            .map(|name| (name, Mutex::new(ProviderHealth::default())))
            .collect();

        Self { config, providers }
    }

    /// Whether the provider may be attempted right now.
    pub async fn may_attempt(&self, name: &str) -> bool {
        self.may_attempt_at(name, Utc::now()).await
    }

    pub(crate) async fn may_attempt_at(&self, name: &str, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.providers.get(name) else {
            warn!("Health check for unknown provider '{}'", name);
            return false;
        };

        let health = entry.lock().await;

        if let Some(open_until) = health.circuit_open_until
            && now < open_until
        {
            return false;
        }

        if let Some(window) = health.rate_limit
            && window.remaining == 0
            && now < window.reset_at
        {
            return false;
        }

        true
    }

    /// Record a failed attempt. Reaching the configured threshold opens
    /// the circuit for the cool-down window and resets the counter.
    pub async fn record_failure(&self, name: &str) {
        self.record_failure_at(name, Utc::now()).await;
    }

    pub(crate) async fn record_failure_at(&self, name: &str, now: DateTime<Utc>) {
        let Some(entry) = self.providers.get(name) else {
            warn!("Recorded failure for unknown provider '{}'", name);
            return;
        };

        let mut health = entry.lock().await;
        health.consecutive_failures += 1;

        if health.consecutive_failures >= self.config.failure_threshold {
            let open_until = now
                + chrono::Duration::from_std(self.config.circuit_cooldown).unwrap_or_default();
            health.circuit_open_until = Some(open_until);
            health.consecutive_failures = 0;
            warn!(
                "Circuit opened for provider '{}' until {}",
                name, open_until
            );
        }
    }

    /// Record a successful attempt. Only the failure counter resets; an
    /// open circuit is left alone since `may_attempt` would have blocked
    /// the call while the window was active.
    pub async fn record_success(&self, name: &str) {
        let Some(entry) = self.providers.get(name) else {
            warn!("Recorded success for unknown provider '{}'", name);
            return;
        };

        let mut health = entry.lock().await;
        health.consecutive_failures = 0;
    }

    /// Overwrite the provider's quota window with what the provider
    /// itself reported. Provider-reported truth wins over anything we
    /// could estimate locally.
    pub async fn record_rate_limit(&self, name: &str, remaining: u64, reset_at: DateTime<Utc>) {
        let Some(entry) = self.providers.get(name) else {
            warn!("Recorded rate limit for unknown provider '{}'", name);
            return;
        };

        let mut health = entry.lock().await;
        health.rate_limit = Some(RateLimitWindow { remaining, reset_at });
        debug!(
            "Provider '{}' reported {} requests remaining, window resets at {}",
            name, remaining, reset_at
        );
    }

    /// Classify every configured provider for external observability.
    pub async fn status(&self) -> Vec<ProviderHealthStatus> {
        self.status_at(Utc::now()).await
    }

    pub(crate) async fn status_at(&self, now: DateTime<Utc>) -> Vec<ProviderHealthStatus> {
        let mut statuses = Vec::with_capacity(self.providers.len());

        for (name, entry) in &self.providers {
            let health = entry.lock().await;

            let state = if let Some(until) = health.circuit_open_until.filter(|t| now < *t) {
                CircuitState::Open { until }
            } else if let Some(window) = health
                .rate_limit
                .filter(|w| w.remaining == 0 && now < w.reset_at)
            {
                CircuitState::RateLimited {
                    reset_at: window.reset_at,
                }
            } else {
                CircuitState::Closed
            };

            statuses.push(ProviderHealthStatus {
                name: name.clone(),
                state,
                consecutive_failures: health.consecutive_failures,
                remaining_quota: health.rate_limit.map(|w| w.remaining),
            });
        }

        // HashMap order is arbitrary; keep dashboard output stable.
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }
}
