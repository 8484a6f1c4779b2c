//! Request descriptor.

use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Raw text, sent as-is.
    Text(String),
    /// JSON document, serialized on send.
    Json(serde_json::Value),
    /// Opaque binary payload.
    Binary(Bytes),
    /// Multipart form.
    Form(Vec<FormField>),
}

impl Body {
    /// True for payloads that carry no bytes at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Text(s) => s.is_empty(),
            Body::Binary(b) => b.is_empty(),
            Body::Form(fields) => fields.is_empty(),
            Body::Json(_) => false,
        }
    }
}

/// A multipart form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        data: Bytes,
    },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormField::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        FormField::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: None,
            data: data.into(),
        }
    }
}

/// What to fetch and how.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Body>,
}

impl Request {
    /// Build a request for an absolute URL.
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| {
            Error::validation_with_context(
                format!("invalid request URL '{}'", url),
                ErrorContext::new()
                    .with_field_path("request.url")
                    .with_details(e.to_string())
                    .with_source("request_builder"),
            )
        })?;
        Ok(Self::from_url(method, url))
    }

    pub fn from_url(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: &str) -> Result<Self> {
        Self::new(Method::GET, url)
    }

    pub fn head(url: &str) -> Result<Self> {
        Self::new(Method::HEAD, url)
    }

    pub fn post(url: &str) -> Result<Self> {
        Self::new(Method::POST, url)
    }

    pub fn put(url: &str) -> Result<Self> {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: &str) -> Result<Self> {
        Self::new(Method::DELETE, url)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a header from untyped strings, rejecting invalid names or values.
    pub fn try_header(self, name: &str, value: &str) -> Result<Self> {
        let invalid = |details: String| {
            Error::validation_with_context(
                format!("invalid header '{}'", name),
                ErrorContext::new()
                    .with_field_path("request.headers")
                    .with_details(details)
                    .with_source("request_builder"),
            )
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        Ok(self.with_header(header_name, header_value))
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_body(Body::Text(text.into()))
    }

    pub fn with_json(self, value: serde_json::Value) -> Self {
        self.with_body(Body::Json(value))
    }

    pub fn with_bytes(self, data: impl Into<Bytes>) -> Self {
        self.with_body(Body::Binary(data.into()))
    }

    pub fn with_form(self, fields: Vec<FormField>) -> Self {
        self.with_body(Body::Form(fields))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Value of the `content-type` header, if set and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}
