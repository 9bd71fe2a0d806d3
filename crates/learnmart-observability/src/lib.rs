//! LearnMart Observability
//!
//! Provides configurable observability features including:
//! - Tracing and distributed tracing via OpenTelemetry
//! - Metrics collection via Prometheus
//! - HTTP request logging with request ids
//!
//! Compiled in through the `observability` feature (on by default). At
//! runtime `OBSERVABILITY_ENABLED=false` falls back to console logging only.
//!
//! # Examples
//!
//! ```no_run
//! use learnmart_observability::{init_logging, shutdown_tracer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_logging()?;
//!     // ... application code ...
//!     shutdown_tracer().await;
//!     Ok(())
//! }
//! ```

pub mod basic_logging;
pub mod request_id;

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

pub use basic_logging::init_basic_console_logging;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};

#[cfg(feature = "observability")]
pub use logging::{init_tracing, logging_middleware, shutdown_tracer};
#[cfg(feature = "observability")]
pub use metrics::{
    PrometheusHandle, init_metrics, metrics_app, metrics_middleware, track_bid_placed,
    track_coins_purchased, track_enrollment, track_lecture_event, track_token_issued,
    track_user_created, track_user_login_failure, track_user_login_success,
};

/// `OBSERVABILITY_ENABLED` unset, or anything but `false`/`0`.
pub fn is_observability_enabled() -> bool {
    use std::sync::OnceLock;

    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Full tracing when observability is on, console logging otherwise.
pub fn init_logging() -> anyhow::Result<()> {
    #[cfg(feature = "observability")]
    {
        if is_observability_enabled() {
            return init_tracing();
        }
    }

    init_basic_console_logging();
    Ok(())
}

// No-op stubs when observability is compiled out
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{extract::Request, middleware::Next, response::Response};

    pub async fn logging_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub async fn shutdown_tracer() {}

    pub fn track_user_created(_role: &str) {}
    pub fn track_user_login_success(_role: &str) {}
    pub fn track_user_login_failure(_reason: &str) {}
    pub fn track_token_issued(_kind: &str) {}
    pub fn track_enrollment() {}
    pub fn track_bid_placed() {}
    pub fn track_coins_purchased(_coins: i64) {}
    pub fn track_lecture_event(_event: &str) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
