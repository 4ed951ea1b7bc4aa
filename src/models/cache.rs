use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_millis(30_000);

#[derive(Clone)]
pub struct CacheEntry {
    pub key: Option<String>,
    pub data: Value,
    pub timestamp: Instant,
}

/// Single-slot response cache for one proxied endpoint.
///
/// Holds at most one entry. A key-sensitive endpoint that sees a new key
/// replaces the slot outright, so alternating queries evict each other.
/// Reads and writes lock only for the copy; concurrent misses may both
/// fetch and the last `put` wins.
pub struct ResponseCache {
    name: &'static str,
    ttl: Duration,
    slot: Mutex<Option<CacheEntry>>,
}

impl ResponseCache {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self, key: Option<&str>) -> Option<Value> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = slot.as_ref()?;

        if entry.key.as_deref() != key {
            debug!(cache = self.name, "Cache miss: key changed");
            return None;
        }
        if entry.timestamp.elapsed() >= self.ttl {
            debug!(cache = self.name, "Cache miss: entry stale");
            return None;
        }

        debug!(cache = self.name, "Cache hit");
        Some(entry.data.clone())
    }

    pub fn put(&self, key: Option<String>, data: Value) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(CacheEntry {
            key,
            data,
            timestamp: Instant::now(),
        });
    }
}
