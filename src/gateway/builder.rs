use crate::cache::{CacheManager, CacheStore, MemoryStore};
use crate::config::{shared, GatewayConfig, GatewayOptions};
use crate::gateway::Gateway;
use crate::scheduler::Scheduler;
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;

/// Builder for [`Gateway`].
///
/// Anything left unset falls back to an [`HttpTransport`] with default
/// settings, a [`MemoryStore`] and the default configuration.
pub struct GatewayBuilder {
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CacheStore>>,
    options: GatewayOptions,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            store: None,
            options: GatewayOptions::default(),
        }
    }

    /// Use a custom network layer (a configured [`HttpTransport`], or a mock in tests).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom cache store.
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Initial configuration; same semantics as [`Gateway::configure`].
    pub fn options(mut self, options: GatewayOptions) -> Self {
        let prefix = self.options.key_prefix.take();
        self.options = options;
        if self.options.key_prefix.is_none() {
            self.options.key_prefix = prefix;
        }
        self
    }

    /// Namespace every cache key; changing it invalidates existing entries.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.key_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> Result<Gateway> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new()?),
        };
        let store: Arc<dyn CacheStore> = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::default()));

        let config = shared(GatewayConfig::from_options(&self.options));
        let cache = Arc::new(CacheManager::new(store, config.clone()));
        let scheduler = Scheduler::new(transport, Arc::clone(&cache), config.clone());
        Ok(Gateway::from_parts(config, cache, scheduler))
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
