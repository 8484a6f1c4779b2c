//! 遥测模块：基于 tracing 的日志订阅器初始化。
//!
//! Every gateway component logs through `tracing` with structured fields
//! (`cache_key`, `task_id`, `retry`, `delay_ms`, `status`, `duration_ms`).
//! Informational events are emitted only while `enable_logging` is set in the
//! live [`crate::GatewayConfig`]; store failures are always reported at
//! `warn`.
//!
//! Applications that already install a subscriber do not need this module.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (for example `"request_gateway=debug"`).
///
/// Returns `false` if a global subscriber was already set.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
