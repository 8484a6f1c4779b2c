//! Cache store implementations.

use super::key::CacheKey;
use super::{CACHE_AGE_HEADER, CACHE_HIT_HEADER, CACHE_KEY_HEADER, CACHE_TIMESTAMP_HEADER};
use crate::types::Response;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

/// A stored response.
///
/// The write time lives in the `x-cache-timestamp` header, so the header set is
/// the whole persisted format. An entry with no readable timestamp is treated
/// as infinitely old.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    #[serde(with = "body_base64")]
    pub body: Bytes,
}

impl CacheEntry {
    /// Snapshot a response, tagging it with the key and write time.
    pub fn from_response(key: &CacheKey, response: &Response, written_at_ms: u64) -> Self {
        let mut headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| {
                let n = name.as_str();
                n != CACHE_TIMESTAMP_HEADER && n != CACHE_KEY_HEADER
            })
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        headers.push((CACHE_TIMESTAMP_HEADER.to_string(), written_at_ms.to_string()));
        headers.push((CACHE_KEY_HEADER.to_string(), key.as_str().to_string()));

        Self {
            status: response.status().as_u16(),
            status_text: response.status_text().to_string(),
            headers,
            body: response.body().clone(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn written_at_ms(&self) -> Option<u64> {
        self.header(CACHE_TIMESTAMP_HEADER)?.trim().parse().ok()
    }

    /// Age at `now_ms`; `None` when the timestamp is missing or unreadable.
    pub fn age(&self, now_ms: u64) -> Option<Duration> {
        self.written_at_ms()
            .map(|written| Duration::from_millis(now_ms.saturating_sub(written)))
    }

    /// Valid iff `age <= ttl`.
    pub fn is_fresh(&self, ttl: Duration, now_ms: u64) -> bool {
        self.age(now_ms).map(|age| age <= ttl).unwrap_or(false)
    }

    /// Approximate footprint in bytes.
    pub fn size(&self) -> u64 {
        let headers: usize = self.headers.iter().map(|(n, v)| n.len() + v.len()).sum();
        (self.body.len() + headers + self.status_text.len()) as u64
    }

    /// Rebuild a response carrying the hit markers.
    pub fn to_hit_response(&self, age: Duration) -> Response {
        let mut map = HeaderMap::with_capacity(self.headers.len() + 2);
        for (name, value) in &self.headers {
            if let (Ok(n), Ok(v)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                map.append(n, v);
            }
        }
        map.insert(CACHE_HIT_HEADER, HeaderValue::from_static("true"));
        map.insert(CACHE_AGE_HEADER, HeaderValue::from(age.as_millis() as u64));

        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        Response::new(status, map, self.body.clone()).with_status_text(self.status_text.clone())
    }
}

mod body_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

/// Keyed storage for cache entries.
///
/// Stores know nothing about TTLs; expiry is decided by [`super::CacheManager`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;
    async fn save(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()>;
    async fn delete(&self, key: &CacheKey) -> Result<bool>;
    async fn list_keys(&self) -> Result<Vec<CacheKey>>;
    async fn clear(&self) -> Result<()>;
    /// Best-effort size in bytes, 0 if unknown.
    async fn estimate_size(&self) -> Result<u64>;
    fn name(&self) -> &'static str;
}

/// In-memory store, evicting least recently used entries past `max_entries`.
pub struct MemoryStore {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        Ok(self.entries().get(key).cloned())
    }
    async fn save(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
        self.entries().put(key.clone(), entry.clone());
        Ok(())
    }
    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.entries().pop(key).is_some())
    }
    async fn list_keys(&self) -> Result<Vec<CacheKey>> {
        Ok(self.entries().iter().map(|(k, _)| k.clone()).collect())
    }
    async fn clear(&self) -> Result<()> {
        self.entries().clear();
        Ok(())
    }
    async fn estimate_size(&self) -> Result<u64> {
        Ok(self
            .entries()
            .iter()
            .map(|(k, e)| k.as_str().len() as u64 + e.size())
            .sum())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}

pub struct NullStore;
impl NullStore {
    pub fn new() -> Self {
        Self
    }
}
impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for NullStore {
    async fn load(&self, _: &CacheKey) -> Result<Option<CacheEntry>> {
        Ok(None)
    }
    async fn save(&self, _: &CacheKey, _: &CacheEntry) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _: &CacheKey) -> Result<bool> {
        Ok(false)
    }
    async fn list_keys(&self) -> Result<Vec<CacheKey>> {
        Ok(Vec::new())
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
    async fn estimate_size(&self) -> Result<u64> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &'static str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        Response::new(StatusCode::OK, headers, body)
    }

    #[test]
    fn test_entry_tags_key_and_timestamp() {
        let key = CacheKey::new("GET|https://example.com/");
        let entry = CacheEntry::from_response(&key, &response("hi"), 1_000);
        assert_eq!(entry.written_at_ms(), Some(1_000));
        assert_eq!(entry.header("x-cache-key"), Some("GET|https://example.com/"));
        assert_eq!(entry.header("Content-Type"), Some("text/plain"));
        assert_eq!(entry.status_text, "OK");
    }

    #[test]
    fn test_freshness_boundary() {
        let key = CacheKey::new("k");
        let entry = CacheEntry::from_response(&key, &response("hi"), 10_000);
        let ttl = Duration::from_millis(500);
        assert!(entry.is_fresh(ttl, 10_500));
        assert!(!entry.is_fresh(ttl, 10_501));
        assert_eq!(entry.age(10_200), Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_missing_timestamp_is_never_fresh() {
        let entry = CacheEntry {
            status: 200,
            status_text: "OK".into(),
            headers: vec![],
            body: Bytes::from_static(b"x"),
        };
        assert_eq!(entry.age(5), None);
        assert!(!entry.is_fresh(Duration::MAX, 5));
    }

    #[test]
    fn test_hit_response_markers() {
        let key = CacheKey::new("k");
        let entry = CacheEntry::from_response(&key, &response("hello"), 0);
        let hit = entry.to_hit_response(Duration::from_millis(42));
        assert!(hit.is_cache_hit());
        assert_eq!(hit.cache_age(), Some(Duration::from_millis(42)));
        assert_eq!(hit.header("x-cache-timestamp"), Some("0"));
        assert_eq!(hit.text(), "hello");
    }

    #[test]
    fn test_entry_json_roundtrip_keeps_binary_body() {
        let entry = CacheEntry {
            status: 201,
            status_text: "Created".into(),
            headers: vec![("x-cache-timestamp".into(), "7".into())],
            body: Bytes::from_static(&[0, 159, 146, 150]),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: CacheEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[tokio::test]
    async fn test_memory_store_basic_ops() {
        let store = MemoryStore::new(10);
        let key = CacheKey::new("k1");
        let entry = CacheEntry::from_response(&key, &response("hi"), 1);

        assert!(store.load(&key).await.unwrap().is_none());
        store.save(&key, &entry).await.unwrap();
        assert_eq!(store.load(&key).await.unwrap(), Some(entry));
        assert_eq!(store.list_keys().await.unwrap(), vec![key.clone()]);
        assert!(store.estimate_size().await.unwrap() > 0);
        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_evicts_least_recently_used() {
        let store = MemoryStore::new(2);
        let (a, b, c) = (CacheKey::new("a"), CacheKey::new("b"), CacheKey::new("c"));
        let entry = CacheEntry::from_response(&a, &response("x"), 1);
        store.save(&a, &entry).await.unwrap();
        store.save(&b, &entry).await.unwrap();
        // touch `a` so `b` becomes the eviction candidate
        store.load(&a).await.unwrap();
        store.save(&c, &entry).await.unwrap();
        assert!(store.load(&a).await.unwrap().is_some());
        assert!(store.load(&b).await.unwrap().is_none());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_null_store() {
        let store = NullStore::new();
        let key = CacheKey::new("k");
        let entry = CacheEntry::from_response(&key, &response("x"), 1);
        store.save(&key, &entry).await.unwrap();
        assert!(store.load(&key).await.unwrap().is_none());
        assert_eq!(store.estimate_size().await.unwrap(), 0);
    }
}
