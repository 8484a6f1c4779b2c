//! Gateway configuration.
//!
//! [`GatewayConfig`] is replaced as a whole by [`crate::Gateway::configure`];
//! every component reads a snapshot of it, so a task that already captured a
//! snapshot (for instance a retry delay that is already scheduled) is not
//! affected by later changes.

use crate::resilience::retry::RetryPolicy;
use arc_swap::ArcSwap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 100;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Live gateway settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Maximum concurrently running network calls (always >= 1).
    pub concurrency: usize,
    /// Maximum age of a cache entry that may still be served.
    pub cache_ttl: Duration,
    pub enable_cache: bool,
    /// Emit informational gateway events through `tracing`.
    pub enable_logging: bool,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each subsequent one.
    pub retry_delay: Duration,
    /// Namespace for cache keys; change it to invalidate all existing entries.
    pub key_prefix: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            cache_ttl: DEFAULT_CACHE_TTL,
            enable_cache: true,
            enable_logging: false,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            key_prefix: None,
        }
    }
}

impl GatewayConfig {
    /// Omitted options take their defaults; concurrency is clamped to at least 1.
    pub fn from_options(opts: &GatewayOptions) -> Self {
        let defaults = Self::default();
        Self {
            concurrency: opts.concurrency.unwrap_or(defaults.concurrency).max(1),
            cache_ttl: opts.cache_ttl.unwrap_or(defaults.cache_ttl),
            enable_cache: opts.enable_cache.unwrap_or(defaults.enable_cache),
            enable_logging: opts.enable_logging.unwrap_or(defaults.enable_logging),
            max_retries: opts.max_retries.unwrap_or(defaults.max_retries),
            retry_delay: opts.retry_delay.unwrap_or(defaults.retry_delay),
            key_prefix: opts.key_prefix.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }
}

/// Partial settings passed to `configure`; `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayOptions {
    pub concurrency: Option<usize>,
    pub cache_ttl: Option<Duration>,
    pub enable_cache: Option<bool>,
    pub enable_logging: Option<bool>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub key_prefix: Option<String>,
}

impl GatewayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `GATEWAY_*` variables. Unset or unparsable variables stay `None`.
    pub fn from_env() -> Self {
        Self {
            concurrency: env_parse("GATEWAY_CONCURRENCY"),
            cache_ttl: env_parse::<u64>("GATEWAY_CACHE_TTL_SECS").map(Duration::from_secs),
            enable_cache: env_bool("GATEWAY_ENABLE_CACHE"),
            enable_logging: env_bool("GATEWAY_ENABLE_LOGGING"),
            max_retries: env_parse("GATEWAY_MAX_RETRIES"),
            retry_delay: env_parse::<u64>("GATEWAY_RETRY_DELAY_MS").map(Duration::from_millis),
            key_prefix: env::var("GATEWAY_CACHE_KEY_PREFIX")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = Some(n);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = Some(enabled);
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = Some(enabled);
        self
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Config cell shared by the cache, the scheduler and the façade.
pub(crate) type SharedConfig = Arc<ArcSwap<GatewayConfig>>;

pub(crate) fn shared(config: GatewayConfig) -> SharedConfig {
    Arc::new(ArcSwap::from_pointee(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.concurrency, 100);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(604_800));
        assert!(cfg.enable_cache);
        assert!(!cfg.enable_logging);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_from_options_fills_defaults_and_clamps() {
        let cfg = GatewayConfig::from_options(
            &GatewayOptions::new()
                .with_concurrency(0)
                .with_max_retries(5),
        );
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(cfg.retry_delay, DEFAULT_RETRY_DELAY);
    }

    #[test]
    fn test_retry_policy_follows_config() {
        let cfg = GatewayConfig::from_options(
            &GatewayOptions::new()
                .with_max_retries(2)
                .with_retry_delay(Duration::from_millis(100)),
        );
        let policy = cfg.retry_policy();
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
    }

    #[test]
    fn test_shared_config_is_replaced_whole() {
        let cell = shared(GatewayConfig::default());
        let before = cell.load_full();
        cell.store(Arc::new(GatewayConfig::from_options(
            &GatewayOptions::new().with_concurrency(2),
        )));
        assert_eq!(before.concurrency, 100);
        assert_eq!(cell.load().concurrency, 2);
    }
}
