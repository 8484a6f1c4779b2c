//! Cache key generation.

use crate::types::{Body, Request};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Separator between key parts. Not expected inside URLs.
pub const KEY_DELIMITER: char = '|';

const FORM_SENTINEL: &str = "FormData";
const BINARY_SENTINEL: &str = "Binary";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// GET and HEAD responses are cacheable; nothing else is.
pub fn is_cacheable_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Builds keys as `METHOD|url[|body][|ct:content-type]`.
///
/// Part order is part of the persisted format. Changing it orphans every
/// existing entry, so bump the prefix when you do.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyBuilder {
    prefix: Option<String>,
}

impl CacheKeyBuilder {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Namespace every key as `<prefix>:<key>`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn build(&self, request: &Request) -> CacheKey {
        let mut parts: Vec<String> = vec![
            request.method().as_str().to_uppercase(),
            request.url().to_string(),
        ];

        if let Some(body) = request.body().filter(|b| !b.is_empty()) {
            parts.push(match body {
                Body::Text(text) => text.clone(),
                Body::Form(_) => FORM_SENTINEL.to_string(),
                Body::Binary(_) => BINARY_SENTINEL.to_string(),
                Body::Json(value) => value.to_string(),
            });
        }

        if let Some(ct) = request.content_type() {
            parts.push(format!("ct:{}", ct));
        }

        let key = parts.join(&KEY_DELIMITER.to_string());
        match self.prefix {
            Some(ref p) => CacheKey::new(format!("{}:{}", p, key)),
            None => CacheKey::new(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormField;
    use reqwest::header::{HeaderValue, CONTENT_TYPE};

    #[test]
    fn test_plain_get() {
        let key = CacheKeyBuilder::new().build(&Request::get("https://example.com/a?x=1").unwrap());
        assert_eq!(key.as_str(), "GET|https://example.com/a?x=1");
    }

    #[test]
    fn test_all_parts_in_order() {
        let req = Request::post("https://example.com/a")
            .unwrap()
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_json(serde_json::json!({"q": "x"}));
        let key = CacheKeyBuilder::new().build(&req);
        assert_eq!(
            key.as_str(),
            r#"POST|https://example.com/a|{"q":"x"}|ct:application/json"#
        );
    }

    #[test]
    fn test_body_sentinels_and_empty_body() {
        let builder = CacheKeyBuilder::new();
        let form = Request::post("https://example.com/u")
            .unwrap()
            .with_form(vec![FormField::text("a", "b")]);
        assert_eq!(builder.build(&form).as_str(), "POST|https://example.com/u|FormData");

        let bin = Request::put("https://example.com/u").unwrap().with_bytes(vec![1u8, 2, 3]);
        assert_eq!(builder.build(&bin).as_str(), "PUT|https://example.com/u|Binary");

        let empty = Request::get("https://example.com/u").unwrap().with_text("");
        assert_eq!(builder.build(&empty).as_str(), "GET|https://example.com/u");
    }

    #[test]
    fn test_identical_requests_share_a_key() {
        let builder = CacheKeyBuilder::new();
        let a = Request::get("https://example.com/a").unwrap().with_text("same");
        let b = Request::get("https://example.com/a").unwrap().with_text("same");
        assert_eq!(builder.build(&a), builder.build(&b));
    }

    #[test]
    fn test_each_field_changes_the_key() {
        let builder = CacheKeyBuilder::new();
        let base = builder.build(&Request::get("https://example.com/a").unwrap());
        let other_method = builder.build(&Request::head("https://example.com/a").unwrap());
        let other_url = builder.build(&Request::get("https://example.com/b").unwrap());
        let other_body =
            builder.build(&Request::get("https://example.com/a").unwrap().with_text("x"));
        let other_ct = builder.build(
            &Request::get("https://example.com/a")
                .unwrap()
                .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain")),
        );
        for k in [&other_method, &other_url, &other_body, &other_ct] {
            assert_ne!(&base, k);
        }
    }

    #[test]
    fn test_prefix() {
        let key = CacheKeyBuilder::new()
            .with_prefix("v2")
            .build(&Request::get("https://example.com/").unwrap());
        assert_eq!(key.as_str(), "v2:GET|https://example.com/");
    }

    #[test]
    fn test_cacheable_methods() {
        assert!(is_cacheable_method(&Method::GET));
        assert!(is_cacheable_method(&Method::HEAD));
        assert!(!is_cacheable_method(&Method::POST));
        assert!(!is_cacheable_method(&Method::DELETE));
    }
}
