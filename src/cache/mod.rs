//! 响应缓存模块：按请求键缓存幂等响应，支持 TTL 过期与可插拔存储。
//!
//! # Response Cache Module
//!
//! Cache-aside storage for responses to idempotent requests. The gateway looks
//! a request up before it is queued and writes successful responses back after
//! the network call. Entries expire lazily: a lookup that finds an entry older
//! than the configured TTL deletes it and reports a miss.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheManager`] | Lookup/write-back with TTL, statistics and synthetic headers |
//! | [`CacheStore`] | Trait for keyed entry storage |
//! | [`MemoryStore`] | In-memory LRU-bounded store |
//! | [`FileStore`] | One JSON file per entry under a directory |
//! | [`NullStore`] | Stores nothing |
//! | [`CacheKeyBuilder`] | Deterministic key from method, URL, body and content type |
//!
//! ## Failure Policy
//!
//! The cache fails open. A store error during lookup counts as an error and a
//! miss and the request goes to the network; a store error during write-back
//! counts as an error and the response is still delivered.
//!
//! ## Example
//!
//! ```rust
//! use request_gateway::cache::{CacheKeyBuilder, CacheStore, MemoryStore};
//! use request_gateway::types::Request;
//!
//! let key = CacheKeyBuilder::new().build(&Request::get("https://example.com/a").unwrap());
//! assert_eq!(key.as_str(), "GET|https://example.com/a");
//!
//! let store = MemoryStore::new(1000);
//! assert_eq!(store.name(), "memory");
//! ```

mod backend;
mod file;
mod key;
mod manager;

pub use backend::{CacheEntry, CacheStore, MemoryStore, NullStore};
pub use file::FileStore;
pub use key::{is_cacheable_method, CacheKey, CacheKeyBuilder, KEY_DELIMITER};
pub use manager::{CacheManager, CacheStats};

/// Unix-millisecond write time, stored with every entry.
pub const CACHE_TIMESTAMP_HEADER: &str = "x-cache-timestamp";
/// Key the entry was written under.
pub const CACHE_KEY_HEADER: &str = "x-cache-key";
/// Set to `true` on responses served from the cache.
pub const CACHE_HIT_HEADER: &str = "x-cache-hit";
/// Entry age in milliseconds, on responses served from the cache.
pub const CACHE_AGE_HEADER: &str = "x-cache-age";
