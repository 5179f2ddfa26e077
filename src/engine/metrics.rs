//! Process-wide usage counters.
//!
//! One aggregate, updated exactly once per completed `generate` call
//! (cache hit, provider success, or demo fallback) and reset only by
//! process restart. The snapshot operation is the observability
//! contract for external dashboards.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// How a completed `generate` call was resolved.
#[derive(Debug, Clone, Copy)]
pub enum RequestOutcome<'a> {
    CacheHit,
    Provider(&'a str),
    Demo,
}

#[derive(Debug, Default)]
struct MetricsData {
    total_requests: u64,
    cache_hits: u64,
    demo_responses: u64,
    per_provider: HashMap<String, u64>,
    cumulative_latency: Duration,
    last_request: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct MetricsAccumulator {
    data: Arc<Mutex<MetricsData>>,
}

/// Point-in-time copy of the aggregate counters.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub demo_responses: u64,
    pub per_provider: HashMap<String, u64>,
    pub average_latency: Duration,
    pub last_request: Option<DateTime<Utc>>,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed call. Callers invoke this exactly once per
    /// `generate`, whatever path resolved it.
    pub async fn record_request(&self, outcome: RequestOutcome<'_>, latency: Duration) {
        let mut data = self.data.lock().await;

        data.total_requests += 1;
        data.cumulative_latency += latency;
        data.last_request = Some(Utc::now());

        match outcome {
            RequestOutcome::CacheHit => data.cache_hits += 1,
            RequestOutcome::Demo => data.demo_responses += 1,
            RequestOutcome::Provider(name) => {
                *data.per_provider.entry(name.to_string()).or_insert(0) += 1;
            }
        }
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let data = self.data.lock().await;

        let average_latency = if data.total_requests > 0 {
            data.cumulative_latency / data.total_requests as u32
        } else {
            Duration::ZERO
        };

        MetricsSnapshot {
            total_requests: data.total_requests,
            cache_hits: data.cache_hits,
            demo_responses: data.demo_responses,
            per_provider: data.per_provider.clone(),
            average_latency,
            last_request: data.last_request,
        }
    }
}
