//! Mock HTTP server setup for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use request_gateway::transport::{HttpTransport, HttpTransportConfig};
use request_gateway::{Gateway, GatewayOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Gateway over a real HTTP transport with a short timeout.
    pub fn gateway(&self, options: GatewayOptions) -> Gateway {
        let transport = HttpTransport::with_config(
            HttpTransportConfig::default().with_timeout(Duration::from_secs(5)),
        )
        .expect("http transport");
        Gateway::builder()
            .transport(Arc::new(transport))
            .options(options)
            .build()
            .expect("gateway")
    }

    /// Create a mock for a JSON response, expected to be hit `hits` times
    pub async fn mock_json_response(
        &self,
        method: &str,
        path: &str,
        status: usize,
        body: &str,
        hits: usize,
    ) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Create a mock that only matches a given JSON request body
    pub async fn mock_json_echo(&self, path: &str, expected: serde_json::Value) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .match_header("content-type", Matcher::Regex("application/json".into()))
            .match_body(Matcher::Json(expected))
            .with_status(201)
            .with_body("created")
            .create_async()
            .await
    }

    /// Create a mock that requires a request header
    pub async fn mock_with_header(&self, path: &str, name: &str, value: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", path)
            .match_header(name, value)
            .with_status(200)
            .with_body("authorized")
            .create_async()
            .await
    }
}

/// URL on a port nothing listens on, for connection failures.
pub fn unreachable_url() -> String {
    "http://127.0.0.1:1/unreachable".to_string()
}
