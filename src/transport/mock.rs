//! Scripted in-process transport.
//!
//! Useful for tests and demos: replies are configured per URL, every call is
//! recorded with its start time, and the transport tracks how many calls were
//! in flight at once.

use super::{Transport, TransportError};
use crate::types::{Request, Response};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// What the mock does for one call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond {
        status: u16,
        headers: Vec<(String, String)>,
        body: Bytes,
    },
    /// Fail the network call itself.
    Fail(String),
}

impl MockReply {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<Bytes>) -> Self {
        MockReply::Respond {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        MockReply::Fail(message.into())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let MockReply::Respond { ref mut headers, .. } = self {
            headers.push((name.into(), value.into()));
        }
        self
    }

    fn into_result(self) -> std::result::Result<Response, TransportError> {
        match self {
            MockReply::Fail(message) => Err(TransportError::Other(message)),
            MockReply::Respond {
                status,
                headers,
                body,
            } => {
                let status = StatusCode::from_u16(status)
                    .map_err(|e| TransportError::Other(format!("mock status: {}", e)))?;
                let mut map = HeaderMap::new();
                for (name, value) in headers {
                    let name = HeaderName::from_bytes(name.as_bytes())
                        .map_err(|e| TransportError::Other(format!("mock header: {}", e)))?;
                    let value = HeaderValue::from_str(&value)
                        .map_err(|e| TransportError::Other(format!("mock header: {}", e)))?;
                    map.append(name, value);
                }
                Ok(Response::new(status, map, body))
            }
        }
    }
}

/// One observed call.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub method: Method,
    pub url: String,
    pub started_at: Instant,
}

#[derive(Default)]
struct Route {
    scripted: VecDeque<MockReply>,
    fallback: Option<MockReply>,
}

/// Scripted transport.
///
/// Per URL, scripted replies are consumed first, then the sticky reply set with
/// [`MockTransport::respond`] repeats. Unknown URLs get a `404`.
pub struct MockTransport {
    routes: Mutex<HashMap<String, Route>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<CallRecord>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Hold every call open for `delay` before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reply to every call for `url` with `reply` once scripted replies run out.
    pub fn respond(&self, url: &str, reply: MockReply) -> &Self {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        routes.entry(normalize(url)).or_default().fallback = Some(reply);
        self
    }

    /// Queue one-shot replies for `url`, consumed in order.
    pub fn script(&self, url: &str, replies: impl IntoIterator<Item = MockReply>) -> &Self {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        routes
            .entry(normalize(url))
            .or_default()
            .scripted
            .extend(replies);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        let url = normalize(url);
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| c.url == url)
            .count()
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open calls observed so far.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> MockReply {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        match routes.get_mut(url) {
            Some(route) => route
                .scripted
                .pop_front()
                .or_else(|| route.fallback.clone())
                .unwrap_or_else(|| MockReply::status(404, "no reply configured")),
            None => MockReply::status(404, "no route"),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &Request) -> std::result::Result<Response, TransportError> {
        let url = request.url().to_string();
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(CallRecord {
                method: request.method().clone(),
                url: url.clone(),
                started_at: Instant::now(),
            });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = self.next_reply(&url);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.into_result()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
