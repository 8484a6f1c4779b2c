//! # request-gateway
//!
//! 客户端请求网关：并发上限调度、带 TTL 的旁路缓存与指数退避重试。
//!
//! Client-side request gateway that bounds concurrency, caches idempotent
//! responses with time-based expiry, and recovers from transient network
//! failures by retrying with exponential backoff.
//!
//! ## Overview
//!
//! Callers hand a [`Request`] to [`Gateway::fetch`] and get back a fully
//! buffered [`Response`]. Between the two:
//!
//! - **Cache-aside**: GET and HEAD requests are answered from a [`cache::CacheStore`]
//!   while the stored entry is younger than the TTL. Successful (2xx) network
//!   responses are written back.
//! - **Admission control**: cache misses wait in a FIFO queue and at most
//!   `concurrency` network calls run at once.
//! - **Retry**: a failed network call is retried after `retry_delay * 2^n`,
//!   ahead of requests that have not run yet. HTTP error statuses are responses,
//!   not failures, and are never retried.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use request_gateway::{Gateway, GatewayOptions, Request};
//!
//! #[tokio::main]
//! async fn main() -> request_gateway::Result<()> {
//!     let gateway = Gateway::new()?;
//!     gateway.configure(GatewayOptions::new().with_concurrency(10).with_max_retries(2));
//!
//!     let resp = gateway.fetch(Request::get("https://example.com/api/report")?).await?;
//!     println!("{} {}", resp.status(), resp.text());
//!
//!     gateway.drain().await;
//!     println!("{:?}", gateway.stats());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`gateway`] | The [`Gateway`] façade and its builder |
//! | [`config`] | [`GatewayConfig`] and partial [`GatewayOptions`] |
//! | [`cache`] | Key builder, stores and the cache-aside manager |
//! | [`scheduler`] | Bounded FIFO admission with retry re-queueing |
//! | [`resilience`] | Retry policy |
//! | [`transport`] | Network call abstraction, reqwest and mock implementations |
//! | [`types`] | Request and response types |
//! | [`telemetry`] | `tracing` subscriber bootstrap |

pub mod cache;
pub mod config;
pub mod gateway;
pub mod resilience;
pub mod scheduler;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use cache::CacheStats;
pub use config::{GatewayConfig, GatewayOptions};
pub use gateway::{Gateway, GatewayBuilder};
pub use scheduler::QueueStatus;
pub use types::{Request, Response};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
