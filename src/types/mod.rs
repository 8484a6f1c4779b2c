//! 类型模块：定义网关的请求描述符与缓冲响应类型。
//!
//! # Types Module
//!
//! Request and response types that flow through the gateway.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Request`] | Method, absolute URL, headers and an optional [`Body`] |
//! | [`Body`] | Text, JSON, raw bytes or multipart form payload |
//! | [`FormField`] | One multipart form field |
//! | [`Response`] | Fully buffered response (status, status text, headers, body) |
//!
//! Requests are cheap to clone so a retried task can replay its request
//! without asking the caller for it again.
//!
//! ## Example
//!
//! ```rust
//! use request_gateway::types::Request;
//! use reqwest::header::{HeaderValue, CONTENT_TYPE};
//!
//! let req = Request::post("https://api.example.com/artifacts")
//!     .unwrap()
//!     .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
//!     .with_json(serde_json::json!({"name": "report"}));
//! assert_eq!(req.content_type(), Some("application/json"));
//! ```

pub mod request;
pub mod response;

pub use request::{Body, FormField, Request};
pub use response::Response;
