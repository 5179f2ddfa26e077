pub mod cache;
pub mod demo;
pub mod health;
pub mod metrics;
pub mod orchestrator;
pub mod types;


pub use cache::{fingerprint, MemoryResponseCache, ResponseCache};
pub use demo::{DemoResponder, DEMO_PROVIDER_NAME};
pub use health::{CircuitState, ProviderHealthStatus, ProviderHealthTracker};
pub use metrics::{MetricsAccumulator, MetricsSnapshot, RequestOutcome};
pub use orchestrator::ResponseOrchestrator;
pub use types::*;
