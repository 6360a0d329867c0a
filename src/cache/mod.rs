//! TTL cache for expensive derived render output.
//!
//! Providers that serialize chart payloads or other deterministic render
//! output use [`RenderCache::get_or_render`] to skip recomputation within a
//! TTL window. Key construction is the caller's responsibility; the
//! recommended scheme is produced by [`render_cache_key`] so that any
//! configuration change naturally invalidates the entry without an explicit
//! invalidation API.
//!
//! Two callers racing on the same missing key may both invoke the render
//! closure (last writer wins on the store). The closure is expected to be a
//! pure function of its key, so the race only costs a redundant render.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::ConfigMap;

#[cfg(test)]
mod tests;

/// In-memory TTL cache keyed by caller-supplied strings.
///
/// Entries are evicted lazily: a read that finds an expired entry deletes it
/// and falls through to the render closure. Nothing sweeps proactively.
pub struct RenderCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl RenderCache {
    /// Builds a cache whose entries live for `ttl` after each store.
    ///
    /// A zero TTL turns the cache into a pass-through: every call invokes
    /// the render closure and nothing is stored.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, or renders and stores a new one.
    ///
    /// The render closure runs only on a miss (or past expiry). A render
    /// failure propagates to the caller and stores nothing, so failed renders
    /// are retried on the next call.
    pub fn get_or_render<E>(
        &self,
        key: &str,
        render: impl FnOnce() -> Result<String, E>,
    ) -> Result<String, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = render()?;
        self.set(key, value.clone());
        Ok(value)
    }

    fn get(&self, key: &str) -> Option<String> {
        if self.ttl.is_zero() {
            return None;
        }
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if Instant::now() < entry.expires_at => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }
        // Expired: drop it so the map does not accumulate dead entries.
        self.entries.write().remove(key);
        None
    }

    fn set(&self, key: &str, value: String) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.write().insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

/// Returns a deterministic fingerprint for a widget configuration.
///
/// Configurations serialize canonically (ordered keys), so equal maps always
/// fingerprint equally within a process.
pub fn config_fingerprint(cfg: &ConfigMap) -> String {
    if cfg.is_empty() {
        return "empty".to_string();
    }
    let serialized = match serde_json::to_string(cfg) {
        Ok(s) => s,
        Err(_) => return "invalid".to_string(),
    };
    let mut hasher = DefaultHasher::new();
    serialized.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Builds the recommended cache key for one widget instance render.
///
/// Layout: `definitionCode:instanceID:variant:hash(configuration)`.
pub fn render_cache_key(
    definition_code: &str,
    instance_id: &str,
    variant: &str,
    cfg: &ConfigMap,
) -> String {
    format!(
        "{}:{}:{}:{}",
        definition_code,
        instance_id,
        variant,
        config_fingerprint(cfg)
    )
}
