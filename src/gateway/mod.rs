//! 网关门面模块：组合缓存、调度与重试，对外提供统一的 fetch 入口。
//!
//! # Gateway Façade
//!
//! [`Gateway`] is the only type most callers touch. A cacheable request
//! (GET/HEAD with the cache enabled) is answered from the store when a fresh
//! entry exists; everything else goes through the admission scheduler, which
//! bounds concurrency and retries transport failures.
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | [`Gateway::fetch`] | Cache-aside fetch through the scheduler |
//! | [`Gateway::fetch_all`] | Concurrent fetch of many requests, in input order |
//! | [`Gateway::configure`] | Replace the live configuration |
//! | [`Gateway::drain`] | Wait until no work is queued, running or in backoff |
//! | [`Gateway::stats`] | Cache hit/miss/error counters |
//! | [`Gateway::queue_status`] | Active, queued and backoff task counts |
//! | [`Gateway::clear_cache`] | Drop every entry and reset counters |
//! | [`Gateway::clear_expired_cache`] | Sweep entries older than the TTL |
//! | [`Gateway::cache_size`] | Estimated store size in bytes |
//!
//! ```rust,no_run
//! use request_gateway::{Gateway, GatewayOptions, Request};
//! use std::time::Duration;
//!
//! # async fn run() -> request_gateway::Result<()> {
//! let gateway = Gateway::new()?;
//! gateway.configure(
//!     GatewayOptions::new()
//!         .with_concurrency(8)
//!         .with_cache_ttl(Duration::from_secs(300)),
//! );
//! let resp = gateway.fetch(Request::get("https://example.com/api/items")?).await?;
//! println!("{} (cached: {})", resp.status(), resp.is_cache_hit());
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::GatewayBuilder;

use crate::cache::{CacheManager, CacheStats};
use crate::config::{GatewayConfig, GatewayOptions, SharedConfig};
use crate::scheduler::{QueueStatus, Scheduler};
use crate::types::{Request, Response};
use crate::{Error, ErrorContext, Result};
use futures::future::join_all;
use std::sync::Arc;
use tracing::info;

struct GatewayInner {
    config: SharedConfig,
    cache: Arc<CacheManager>,
    scheduler: Scheduler,
}

/// Cheaply cloneable handle; clones share the cache, queue and config.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl Gateway {
    /// Gateway over a default [`crate::transport::HttpTransport`] and an
    /// in-memory LRU store.
    pub fn new() -> Result<Self> {
        GatewayBuilder::new().build()
    }

    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    pub(crate) fn from_parts(
        config: SharedConfig,
        cache: Arc<CacheManager>,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                config,
                cache,
                scheduler,
            }),
        }
    }

    /// Replace the configuration. Omitted options fall back to their defaults,
    /// not to the previous values. The cache key prefix is the exception: it
    /// namespaces every stored entry, so it only changes when set explicitly.
    ///
    /// Tasks already running, and retry delays already scheduled, keep the
    /// snapshot they captured. Queued work is admitted right away if the new
    /// limit allows it.
    pub fn configure(&self, mut options: GatewayOptions) {
        if options.key_prefix.is_none() {
            options.key_prefix = self.inner.config.load().key_prefix.clone();
        }
        let config = GatewayConfig::from_options(&options);
        if config.enable_logging {
            info!(
                concurrency = config.concurrency,
                cache_ttl_secs = config.cache_ttl.as_secs(),
                enable_cache = config.enable_cache,
                max_retries = config.max_retries,
                retry_delay_ms = config.retry_delay.as_millis() as u64,
                "gateway configured"
            );
        }
        self.inner.config.store(Arc::new(config));
        self.inner.scheduler.pump();
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<GatewayConfig> {
        self.inner.config.load_full()
    }

    /// Resolve with the response, served from cache when possible.
    ///
    /// Any HTTP status is a successful result; only transport failures that
    /// outlast the retry budget are errors ([`Error::RetriesExhausted`]).
    pub async fn fetch(&self, request: Request) -> Result<Response> {
        let key = self.inner.cache.key_for(&request);
        if let Some(ref key) = key {
            if let Some(hit) = self.inner.cache.lookup(key).await {
                return Ok(hit);
            }
        }

        let rx = self.inner.scheduler.submit(request, key);
        rx.await.map_err(|_| {
            Error::runtime_with_context(
                "request task ended without a result",
                ErrorContext::new().with_source("scheduler"),
            )
        })?
    }

    /// Fetch every request concurrently; results keep the input order.
    ///
    /// Admission still goes through the scheduler, so at most `concurrency`
    /// network calls run at once however long the list is.
    pub async fn fetch_all<I>(&self, requests: I) -> Vec<Result<Response>>
    where
        I: IntoIterator<Item = Request>,
    {
        join_all(requests.into_iter().map(|req| self.fetch(req))).await
    }

    /// Counters only; `size` is left empty.
    pub fn stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Counters plus the store's size estimate.
    pub async fn stats_with_size(&self) -> CacheStats {
        let mut stats = self.inner.cache.stats();
        stats.size = Some(self.inner.cache.size().await);
        stats
    }

    pub fn reset_stats(&self) {
        self.inner.cache.reset_stats();
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.inner.scheduler.status()
    }

    /// Wait until every submitted request has finished, including those
    /// sleeping before a retry.
    pub async fn drain(&self) {
        self.inner.scheduler.drain().await;
    }

    /// Remove every cache entry and reset the counters.
    pub async fn clear_cache(&self) {
        self.inner.cache.clear().await;
    }

    /// Remove entries older than the TTL; returns how many were removed.
    pub async fn clear_expired_cache(&self) -> usize {
        self.inner.cache.clear_expired().await
    }

    /// Estimated cache size in bytes.
    pub async fn cache_size(&self) -> u64 {
        self.inner.cache.size().await
    }

    /// Name of the configured cache store.
    pub fn store_name(&self) -> &'static str {
        self.inner.cache.store_name()
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &*self.inner.config.load())
            .field("store", &self.inner.cache.store_name())
            .field("queue", &self.inner.scheduler.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CACHE_HIT_HEADER;
    use crate::transport::{MockReply, MockTransport};
    use std::time::Duration;

    fn gateway(mock: Arc<MockTransport>) -> Gateway {
        Gateway::builder()
            .transport(mock)
            .options(GatewayOptions::new().with_retry_delay(Duration::from_millis(5)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_is_cached() {
        let mock = Arc::new(MockTransport::new());
        mock.respond("https://api.test/items", MockReply::ok("[1,2]"));
        let gw = gateway(mock.clone());

        let first = gw.fetch(Request::get("https://api.test/items").unwrap()).await.unwrap();
        assert!(!first.is_cache_hit());
        let second = gw.fetch(Request::get("https://api.test/items").unwrap()).await.unwrap();
        assert!(second.is_cache_hit());
        assert_eq!(second.header(CACHE_HIT_HEADER), Some("true"));
        assert_eq!(second.text(), "[1,2]");

        assert_eq!(mock.calls(), 1);
        let stats = gw.stats();
        assert_eq!((stats.hits, stats.misses, stats.errors), (1, 1, 0));
        assert_eq!(stats.size, None);
    }

    #[tokio::test]
    async fn test_post_bypasses_cache() {
        let mock = Arc::new(MockTransport::new());
        mock.respond("https://api.test/items", MockReply::status(201, "created"));
        let gw = gateway(mock.clone());

        for _ in 0..2 {
            let req = Request::post("https://api.test/items").unwrap().with_text("x");
            let resp = gw.fetch(req).await.unwrap();
            assert!(!resp.is_cache_hit());
        }
        assert_eq!(mock.calls(), 2);
        let stats = gw.stats();
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[tokio::test]
    async fn test_disabled_cache_counts_nothing() {
        let mock = Arc::new(MockTransport::new());
        mock.respond("https://api.test/a", MockReply::ok("a"));
        let gw = gateway(mock.clone());
        gw.configure(GatewayOptions::new().with_cache(false));

        for _ in 0..2 {
            gw.fetch(Request::get("https://api.test/a").unwrap()).await.unwrap();
        }
        assert_eq!(mock.calls(), 2);
        assert_eq!(gw.stats(), CacheStats::default());
        assert_eq!(gw.cache_size().await, 0);
    }

    #[tokio::test]
    async fn test_configure_replaces_whole_config() {
        let gw = gateway(Arc::new(MockTransport::new()));
        gw.configure(GatewayOptions::new().with_concurrency(4));
        gw.configure(GatewayOptions::new().with_max_retries(0));

        let cfg = gw.config();
        assert_eq!(cfg.concurrency, crate::config::DEFAULT_CONCURRENCY);
        assert_eq!(cfg.max_retries, 0);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let mock = Arc::new(MockTransport::new());
        mock.respond("https://api.test/a", MockReply::ok("a"));
        let gw = gateway(mock.clone());
        let other = gw.clone();

        gw.fetch(Request::get("https://api.test/a").unwrap()).await.unwrap();
        let hit = other.fetch(Request::get("https://api.test/a").unwrap()).await.unwrap();
        assert!(hit.is_cache_hit());
        assert_eq!(other.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_order() {
        let mock = Arc::new(MockTransport::new().with_delay(Duration::from_millis(5)));
        for i in 0..4 {
            mock.respond(&format!("https://api.test/{}", i), MockReply::ok(i.to_string()));
        }
        let gw = gateway(mock.clone());
        gw.configure(GatewayOptions::new().with_concurrency(2));

        let reqs = (0..4).map(|i| Request::get(&format!("https://api.test/{}", i)).unwrap());
        let bodies: Vec<String> = gw
            .fetch_all(reqs)
            .await
            .into_iter()
            .map(|r| r.unwrap().text())
            .collect();
        assert_eq!(bodies, vec!["0", "1", "2", "3"]);
        assert_eq!(mock.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_stats_with_size() {
        let mock = Arc::new(MockTransport::new());
        mock.respond("https://api.test/a", MockReply::ok("payload"));
        let gw = gateway(mock);

        gw.fetch(Request::get("https://api.test/a").unwrap()).await.unwrap();
        let stats = gw.stats_with_size().await;
        assert!(stats.size.unwrap_or(0) >= "payload".len() as u64);
    }
}
