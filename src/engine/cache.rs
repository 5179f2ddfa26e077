//! Response caching keyed by a deterministic request fingerprint.
//!
//! Caching is advisory: a miss is always acceptable, including right
//! after a `put`, so the cache can be backed by an external key/value
//! service behind the same trait. The default backing is an in-process
//! concurrent map with last-writer-wins semantics.

use crate::engine::types::GenerationResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Compute the cache key for a request.
///
/// The fingerprint covers exactly the fields that determine the reply:
/// persona, prior context, and prompt. Fields are length-prefixed before
/// hashing so no combination of inputs can collide by concatenation, and
/// leading/trailing whitespace never produces a distinct key.
pub fn fingerprint(persona_id: &str, context: Option<&str>, prompt: &str) -> String {
    let mut hasher = Sha256::new();

    for part in [persona_id.trim(), context.unwrap_or("").trim(), prompt.trim()] {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }

    let digest = hasher.finalize();
    let mut key = String::with_capacity(digest.len() * 2);
    for byte in digest {
        key.push_str(&format!("{:02x}", byte));
    }
    key
}

/// TTL-respecting get/put contract. The orchestrator performs exactly
/// one `get` and at most one `put` per call and never mutates an entry
/// after insertion.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<GenerationResult>;
    async fn put(&self, key: &str, value: GenerationResult, ttl: Duration);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: GenerationResult,
    expires_at: DateTime<Utc>,
}

/// In-process cache. Expired entries are dropped lazily on lookup; a
/// newer `put` for the same key supersedes the old entry whole.
#[derive(Debug, Default)]
pub struct MemoryResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<GenerationResult> {
        let hit = match self.entries.get(key) {
            None => return None,
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => None,
        };

        if hit.is_none() {
            // Expired; the map guard is released above, safe to remove.
            self.entries.remove(key);
        }
        hit
    }

    pub(crate) fn put_at(&self, key: &str, value: GenerationResult, ttl: Duration, now: DateTime<Utc>) {
        let expires_at = now + chrono::Duration::from_std(ttl).unwrap_or_default();
        self.entries.insert(key.to_string(), CacheEntry { value, expires_at });
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn get(&self, key: &str) -> Option<GenerationResult> {
        self.get_at(key, Utc::now())
    }

    async fn put(&self, key: &str, value: GenerationResult, ttl: Duration) {
        self.put_at(key, value, ttl, Utc::now());
    }
}
