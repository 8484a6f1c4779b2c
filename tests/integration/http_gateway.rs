//! Gateway behavior over real HTTP.

use crate::mock_server::{unreachable_url, MockServerFixture};
use request_gateway::transport::TransportError;
use request_gateway::{Error, GatewayOptions, Request};
use std::time::Duration;

#[tokio::test]
async fn test_get_served_from_cache_after_first_call() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response("GET", "/api/items", 200, r#"{"items":[1,2,3]}"#, 1)
        .await;
    let gw = fixture.gateway(GatewayOptions::new());

    let first = gw.fetch(Request::get(&fixture.url("/api/items")).unwrap()).await.unwrap();
    let second = gw.fetch(Request::get(&fixture.url("/api/items")).unwrap()).await.unwrap();

    assert_eq!(first.status().as_u16(), 200);
    assert!(!first.is_cache_hit());
    assert!(second.is_cache_hit());
    assert_eq!(second.body(), first.body());
    assert_eq!(second.header("content-type"), Some("application/json"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_not_retried() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response("GET", "/api/busy", 503, r#"{"error":"busy"}"#, 2)
        .await;
    let gw = fixture.gateway(
        GatewayOptions::new()
            .with_max_retries(3)
            .with_retry_delay(Duration::from_millis(10)),
    );

    for _ in 0..2 {
        let resp = gw.fetch(Request::get(&fixture.url("/api/busy")).unwrap()).await.unwrap();
        assert_eq!(resp.status().as_u16(), 503);
        assert_eq!(resp.status_text(), "Service Unavailable");
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_json_body_is_sent() {
    let fixture = MockServerFixture::new().await;
    let body = serde_json::json!({"name": "report", "rows": 3});
    let mock = fixture.mock_json_echo("/api/reports", body.clone()).await;
    let gw = fixture.gateway(GatewayOptions::new());

    let req = Request::post(&fixture.url("/api/reports")).unwrap().with_json(body);
    let resp = gw.fetch(req).await.unwrap();

    assert_eq!(resp.status().as_u16(), 201);
    assert_eq!(resp.text(), "created");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_request_headers_are_forwarded() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_with_header("/api/me", "authorization", "Bearer t0k3n").await;
    let gw = fixture.gateway(GatewayOptions::new().with_cache(false));

    let req = Request::get(&fixture.url("/api/me"))
        .unwrap()
        .try_header("authorization", "Bearer t0k3n")
        .unwrap();
    let resp = gw.fetch(req).await.unwrap();

    assert_eq!(resp.text(), "authorized");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_failure_exhausts_retries() {
    let fixture = MockServerFixture::new().await;
    let gw = fixture.gateway(
        GatewayOptions::new()
            .with_max_retries(1)
            .with_retry_delay(Duration::from_millis(10)),
    );

    let err = gw.fetch(Request::get(&unreachable_url()).unwrap()).await.unwrap_err();
    match err {
        Error::RetriesExhausted { attempts, source } => {
            assert_eq!(attempts, 2);
            assert!(matches!(source, TransportError::Http(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(gw.queue_status().is_idle());
    assert_eq!(gw.stats().misses, 1);
}
