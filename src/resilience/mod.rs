//! 弹性模块：网络失败时的指数退避重试策略。
//!
//! # Resilience Module
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`retry`] | [`RetryPolicy`]: bounded retries with exponential backoff |
//!
//! Only transport failures are retried. A received response is final whatever
//! its status code.
//!
//! ```rust
//! use request_gateway::resilience::retry::{Decision, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(2, Duration::from_millis(100));
//! assert_eq!(
//!     policy.decide(1),
//!     Decision::Retry { delay: Duration::from_millis(200) }
//! );
//! assert_eq!(policy.decide(2), Decision::Fail);
//! ```

pub mod retry;

pub use retry::{Decision, RetryPolicy};
