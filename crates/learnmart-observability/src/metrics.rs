use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::time::{Duration, Instant};

pub use metrics_exporter_prometheus::PrometheusHandle;

use crate::is_observability_enabled;

/// Installs the Prometheus recorder and its upkeep task.
///
/// `Ok(None)` when observability is disabled.
pub fn init_metrics() -> anyhow::Result<Option<PrometheusHandle>> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )?
        .install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_user_created(role: &str) {
    if is_observability_enabled() {
        counter!("users_created_total", "role" => role.to_string()).increment(1);
    }
}

pub fn track_user_login_success(role: &str) {
    if is_observability_enabled() {
        counter!("user_logins_total", "role" => role.to_string(), "status" => "success").increment(1);
    }
}

pub fn track_user_login_failure(reason: &str) {
    if is_observability_enabled() {
        counter!("user_logins_total", "status" => "failure", "reason" => reason.to_string()).increment(1);
    }
}

/// `kind` is `access`, `refresh` or `reset`.
pub fn track_token_issued(kind: &str) {
    if is_observability_enabled() {
        counter!("tokens_issued_total", "kind" => kind.to_string()).increment(1);
    }
}

pub fn track_enrollment() {
    if is_observability_enabled() {
        counter!("enrollments_total").increment(1);
    }
}

pub fn track_bid_placed() {
    if is_observability_enabled() {
        counter!("bids_placed_total").increment(1);
    }
}

pub fn track_coins_purchased(coins: i64) {
    if is_observability_enabled() {
        counter!("coins_purchased_total").increment(coins.max(0) as u64);
    }
}

pub fn track_lecture_event(event: &str) {
    if is_observability_enabled() {
        counter!("lecture_events_total", "event" => event.to_string()).increment(1);
    }
}
