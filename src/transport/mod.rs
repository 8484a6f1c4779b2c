//! 传输层模块：执行实际网络调用的可替换抽象。
//!
//! # Transport Module
//!
//! The [`Transport`] trait is the single network call the gateway makes per
//! attempt. A transport returns `Ok` for *any* response it managed to receive,
//! whatever its status code, and `Err` only when the call itself failed
//! (connection refused, DNS failure, timeout, broken body stream). Only the
//! `Err` case is subject to retry.
//!
//! | Transport | Description |
//! |-----------|-------------|
//! | [`HttpTransport`] | `reqwest`-backed HTTP client |
//! | [`MockTransport`] | Scripted in-process transport for tests and demos |

pub mod http;
pub mod mock;

pub use http::{HttpTransport, HttpTransportConfig};
pub use mock::{MockReply, MockTransport};

use crate::types::{Request, Response};
use async_trait::async_trait;

/// Performs one network attempt for a request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> std::result::Result<Response, TransportError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Http(e) => e.is_timeout(),
            TransportError::Other(_) => false,
        }
    }
}
