//! # Persona Engine
//!
//! The AI response orchestration core of a persona-driven social
//! application. Given a finished prompt, the engine produces a reply by
//! calling one of several interchangeable LLM providers, handling
//! partial failures, avoiding redundant generation, respecting
//! per-provider quotas, and guaranteeing the caller always receives a
//! usable response even when every external provider is unreachable.
//!
//! ## Architecture Overview
//!
//! The system consists of several key components organized into modules:
//!
//! - **[`engine`]**: The orchestration pipeline — cache, health
//!   tracking, metrics, the demo fallback, and the coordinator itself
//! - **[`providers`]**: Uniform adapters over the supported LLM vendors
//! - **[`config`]**: Configuration discovery, loading, and credential
//!   resolution
//! - **[`cli`]**: Argument parsing for the companion binary
//!
//! ## Features
//!
//! ### 🔁 Provider Failover
//! - **Priority Rotation**: Providers attempted strictly by configured
//!   priority, deterministically, with no cross-provider racing
//! - **Circuit Breaking**: Consecutive failures open a per-provider
//!   circuit for a cool-down window
//! - **Quota Awareness**: Provider-reported rate limits exclude a
//!   provider until its window resets
//!
//! ### 🛡️ Graceful Degradation
//! - **Demo Responder**: A pure, dependency-free fallback guarantees a
//!   reply when no live provider is usable
//! - **Error Absorption**: Provider failures never cross the public
//!   boundary; only invalid requests do
//!
//! ### ⚡ Efficiency & Observability
//! - **Response Cache**: Fingerprinted, TTL-bounded reuse of previous
//!   generations
//! - **Usage Metrics**: Process-wide counters with a snapshot operation
//!   for dashboards
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use persona_engine::config::{runtime_parts, ConfigDiscovery};
//! use persona_engine::engine::{GenerationRequest, MemoryResponseCache, ResponseOrchestrator};
//! use persona_engine::providers::build_providers;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (engine_config, provider_settings) = runtime_parts(ConfigDiscovery::discover()?);
//!     let providers = build_providers(provider_settings, reqwest::Client::new());
//!
//!     let orchestrator = ResponseOrchestrator::new(
//!         providers,
//!         Arc::new(MemoryResponseCache::new()),
//!         engine_config,
//!     );
//!
//!     let request = GenerationRequest {
//!         persona_id: "persona-42".to_string(),
//!         prompt: "What do you make of today's headline?".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let result = orchestrator.generate(request).await?;
//!     println!("[{}] {}", result.provider_name, result.content);
//!     Ok(())
//! }
//! ```

/// The orchestration pipeline.
///
/// Coordinates cache lookup, health-gated provider attempts, outcome
/// bookkeeping, and the offline fallback path.
pub mod engine;

/// Provider adapters.
///
/// One uniform capability trait over the supported vendors, plus the
/// startup factory that builds the rotation from configuration.
pub mod providers;

/// Configuration discovery and loading.
pub mod config;

/// Environment constants and path utilities.
pub mod env;

/// CLI argument parsing for the companion binary.
pub mod cli;

// Re-export the main engine types
pub use engine::{
    EngineConfig, EngineError, GenerationRequest, GenerationResult, MemoryResponseCache,
    MetricsSnapshot, ResponseCache, ResponseOrchestrator, TokenUsage,
};

// Re-export the main provider types
pub use providers::{
    build_providers, ProviderAdapter, ProviderDescriptor, ProviderError, ProviderKind,
    ProviderReply, ProviderSettings,
};

// Re-export configuration entry points
pub use config::{ConfigDiscovery, EngineFileConfig};
