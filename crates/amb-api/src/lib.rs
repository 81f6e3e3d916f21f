//! # amb-api: HTTP Surface for the Approval-Mint Bridge
//!
//! The operator-facing API: relayer status per asset, relayer health, and
//! read-only ledger queries. Not part of the protocol; nothing here can
//! change ledger state.
//!
//! ## API Surface
//!
//! | Prefix | Module | Auth |
//! |--------|--------|------|
//! | `/v1/relays/*`, `/v1/health`, `/v1/stats` | [`routes::relays`] | bearer |
//! | `/v1/approvals/*`, `/v1/mints/*` | [`routes::ledgers`] | bearer |
//! | `/openapi.json` | [`openapi`] | bearer |
//! | `/health/liveness`, `/health/readiness` | probes | none |
//! | `/metrics` | Prometheus scrape | none |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::{ApiConfig, AppState};

/// Assemble the application router.
///
/// Health probes and `/metrics` sit outside the auth middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::relays::router())
        .merge(routes::ledgers::router())
        .merge(openapi::router())
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state);

    Router::new()
        .merge(unauthenticated)
        .merge(api)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "api listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the relayer has reached both ledgers within
/// its staleness window, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.relayer.health();
    if health.healthy {
        return (StatusCode::OK, "ready".to_string());
    }
    let down: Vec<&str> = [
        (!health.permissioned.reachable).then_some("permissioned ledger"),
        (!health.public.reachable).then_some("public ledger"),
    ]
    .into_iter()
    .flatten()
    .collect();
    (
        StatusCode::SERVICE_UNAVAILABLE,
        format!("not ready: {} unreachable", down.join(", ")),
    )
}

/// GET /metrics: Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => AppError::ServiceUnavailable("metrics recorder not installed".to_string())
            .into_response(),
    }
}
