//! HTTP integration tests against a local mock server.

mod http_gateway;
mod mock_server;
