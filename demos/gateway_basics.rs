//! Gateway Basics Example
//!
//! This example walks through the gateway over a scripted in-process
//! transport, so it runs without network access:
//! - Cache hits on repeated GET requests
//! - Bounded concurrency for a burst of requests
//! - Retry with exponential backoff, and a request that gives up
//!
//! Usage:
//!   cargo run --example gateway_basics
//!   RUST_LOG=request_gateway=debug cargo run --example gateway_basics

use anyhow::Context;
use request_gateway::telemetry::init_tracing;
use request_gateway::transport::{MockReply, MockTransport};
use request_gateway::{Gateway, GatewayOptions, Request};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("request_gateway=info");
    println!("=== Request Gateway Demo ===\n");

    let transport = Arc::new(MockTransport::new().with_delay(Duration::from_millis(50)));
    let gateway = Gateway::builder()
        .transport(transport.clone())
        .options(
            GatewayOptions::new()
                .with_concurrency(2)
                .with_max_retries(2)
                .with_retry_delay(Duration::from_millis(100))
                .with_logging(true),
        )
        .build()
        .context("building gateway")?;

    demo_cache(&gateway, &transport).await?;
    demo_concurrency(&gateway, &transport).await?;
    demo_retry(&gateway, &transport).await?;

    gateway.drain().await;
    println!("\nFinal stats: {:?}", gateway.stats_with_size().await);
    Ok(())
}

async fn demo_cache(gateway: &Gateway, transport: &MockTransport) -> anyhow::Result<()> {
    println!("--- Example 1: Cache-aside ---\n");
    let url = "https://demo.example.com/api/dashboard";
    transport.respond(
        url,
        MockReply::ok(r#"{"widgets":4}"#).with_header("content-type", "application/json"),
    );

    for round in 1..=2 {
        let started = Instant::now();
        let resp = gateway.fetch(Request::get(url)?).await?;
        println!(
            "  round {}: status={} cached={} took={:?}",
            round,
            resp.status(),
            resp.is_cache_hit(),
            started.elapsed()
        );
    }
    println!("  stats: {:?}\n", gateway.stats());
    Ok(())
}

async fn demo_concurrency(gateway: &Gateway, transport: &MockTransport) -> anyhow::Result<()> {
    println!("--- Example 2: Bounded concurrency ---\n");
    let urls: Vec<String> = (0..6)
        .map(|i| format!("https://demo.example.com/api/items/{}", i))
        .collect();
    for url in &urls {
        transport.respond(url, MockReply::ok("item"));
    }

    let requests = urls
        .iter()
        .map(|u| Request::get(u))
        .collect::<request_gateway::Result<Vec<_>>>()?;
    let started = Instant::now();
    let results = gateway.fetch_all(requests).await;
    let ok = results.iter().filter(|r| r.is_ok()).count();

    println!(
        "  {} of {} succeeded in {:?} (max in flight: {})\n",
        ok,
        urls.len(),
        started.elapsed(),
        transport.max_in_flight()
    );
    Ok(())
}

async fn demo_retry(gateway: &Gateway, transport: &MockTransport) -> anyhow::Result<()> {
    println!("--- Example 3: Retry with backoff ---\n");
    let flaky = "https://demo.example.com/api/flaky";
    transport
        .script(flaky, [MockReply::fail("connection reset")])
        .respond(flaky, MockReply::ok("recovered"));
    let resp = gateway.fetch(Request::get(flaky)?).await?;
    println!("  flaky endpoint: {}", resp.text());

    let down = "https://demo.example.com/api/down";
    transport.respond(down, MockReply::fail("connection refused"));
    let started = Instant::now();
    match gateway.fetch(Request::get(down)?).await {
        Ok(resp) => println!("  unexpected success: {}", resp.status()),
        Err(e) => println!("  gave up after {:?}: {}", started.elapsed(), e),
    }
    Ok(())
}
