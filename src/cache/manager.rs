//! Cache manager.

use super::backend::{CacheEntry, CacheStore};
use super::key::{is_cacheable_method, CacheKey, CacheKeyBuilder};
use crate::config::SharedConfig;
use crate::types::{Request, Response};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Cache counters. Reset only by an explicit call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    /// Estimated store size in bytes, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            size: None,
        }
    }
    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Cache-aside front for a [`CacheStore`].
///
/// Every store failure is absorbed here: it bumps `errors` and the caller
/// carries on as if the cache were empty.
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    config: SharedConfig,
    stats: AtomicStats,
}

impl CacheManager {
    pub(crate) fn new(store: Arc<dyn CacheStore>, config: SharedConfig) -> Self {
        Self {
            store,
            config,
            stats: AtomicStats::new(),
        }
    }

    /// Key for `request` if it may use the cache under the current config.
    pub fn key_for(&self, request: &Request) -> Option<CacheKey> {
        let cfg = self.config.load();
        if !cfg.enable_cache || !is_cacheable_method(request.method()) {
            return None;
        }
        let mut builder = CacheKeyBuilder::new();
        if let Some(ref prefix) = cfg.key_prefix {
            builder = builder.with_prefix(prefix.clone());
        }
        Some(builder.build(request))
    }

    /// Serve a fresh entry, or `None`.
    ///
    /// Counts exactly one hit or one miss per call (a failing store also counts
    /// an error). An expired entry is deleted on the spot.
    pub async fn lookup(&self, key: &CacheKey) -> Option<Response> {
        let cfg = self.config.load_full();
        if !cfg.enable_cache {
            return None;
        }

        let entry = match self.store.load(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                warn!(cache_key = %key, store = self.store.name(), error = %e, "cache load failed");
                return None;
            }
        };

        let now = now_ms();
        match entry.age(now) {
            Some(age) if age <= cfg.cache_ttl => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                if cfg.enable_logging {
                    debug!(cache_key = %key, age_secs = age.as_secs(), "cache hit");
                }
                Some(entry.to_hit_response(age))
            }
            _ => {
                if let Err(e) = self.store.delete(key).await {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(cache_key = %key, store = self.store.name(), error = %e, "cache delete failed");
                }
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                if cfg.enable_logging {
                    debug!(cache_key = %key, "cache entry expired");
                }
                None
            }
        }
    }

    /// Write a response back. Failures only cost future hits.
    pub async fn store(&self, key: &CacheKey, response: &Response) {
        let cfg = self.config.load_full();
        if !cfg.enable_cache {
            return;
        }
        let entry = CacheEntry::from_response(key, response, now_ms());
        match self.store.save(key, &entry).await {
            Ok(()) => {
                if cfg.enable_logging {
                    debug!(cache_key = %key, bytes = entry.body.len(), "cached response");
                }
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(cache_key = %key, store = self.store.name(), error = %e, "cache save failed");
            }
        }
    }

    /// Delete every entry older than the TTL; returns how many were removed.
    pub async fn clear_expired(&self) -> usize {
        let cfg = self.config.load_full();
        let keys = match self.store.list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(store = self.store.name(), error = %e, "failed to list cache keys");
                return 0;
            }
        };

        let now = now_ms();
        let mut cleared = 0;
        for key in keys {
            let expired = match self.store.load(&key).await {
                Ok(Some(entry)) => !entry.is_fresh(cfg.cache_ttl, now),
                Ok(None) => false,
                Err(e) => {
                    warn!(cache_key = %key, error = %e, "skipping unreadable cache entry");
                    false
                }
            };
            if expired {
                match self.store.delete(&key).await {
                    Ok(true) => cleared += 1,
                    Ok(false) => {}
                    Err(e) => warn!(cache_key = %key, error = %e, "cache delete failed"),
                }
            }
        }

        if cfg.enable_logging {
            info!(cleared, "cleared expired cache entries");
        }
        cleared
    }

    /// Drop every entry and reset the counters.
    pub async fn clear(&self) {
        match self.store.clear().await {
            Ok(()) => {
                self.stats.reset();
                if self.config.load().enable_logging {
                    info!(store = self.store.name(), "cache cleared");
                }
            }
            Err(e) => warn!(store = self.store.name(), error = %e, "failed to clear cache"),
        }
    }

    /// Best-effort size in bytes; 0 when the store cannot tell.
    pub async fn size(&self) -> u64 {
        match self.store.estimate_size().await {
            Ok(size) => size,
            Err(e) => {
                warn!(store = self.store.name(), error = %e, "failed to estimate cache size");
                0
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}
