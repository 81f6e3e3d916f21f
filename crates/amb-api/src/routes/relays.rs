//! # Relayer Routes
//!
//! - `GET  /v1/relays`: every tracked asset
//! - `GET  /v1/relays/{asset_id}`: one asset's relay record
//! - `POST /v1/relays/{asset_id}/retry`: operator retry of a failed asset
//! - `GET  /v1/health`: ledger connectivity and phase counts
//! - `GET  /v1/stats`: relayer counters

use amb_core::AssetId;
use amb_relayer::{HealthReport, LinkHealth, RelayRecord, RelayerStats};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// One asset's relay status.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelayResponse {
    pub asset_id: u64,
    /// Phase name, e.g. `PROVING` or `FAILED`.
    pub phase: String,
    /// Failure kind when `phase` is `FAILED`.
    pub failure: Option<String>,
    pub last_error: Option<String>,
    pub proving_attempts: u32,
    pub submission_attempts: u32,
    /// `sha256:`-prefixed fingerprint of the last proof generated.
    pub proof_fingerprint: Option<String>,
    /// Public-ledger block that carried the mint.
    pub mint_block: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Phase changes, oldest first.
    pub history: Vec<PhaseTransitionResponse>,
}

/// One recorded phase change.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PhaseTransitionResponse {
    pub from: String,
    pub to: String,
    pub at: DateTime<Utc>,
}

impl From<RelayRecord> for RelayResponse {
    fn from(r: RelayRecord) -> Self {
        Self {
            asset_id: r.asset_id.value(),
            phase: r.phase.as_str().to_string(),
            failure: r.failure().map(|f| f.as_str().to_string()),
            last_error: r.last_error,
            proving_attempts: r.proving_attempts,
            submission_attempts: r.submission_attempts,
            proof_fingerprint: r.proof_fingerprint.map(|d| d.to_string()),
            mint_block: r.mint_block,
            created_at: *r.created_at.as_datetime(),
            updated_at: *r.updated_at.as_datetime(),
            history: r
                .history
                .into_iter()
                .map(|t| PhaseTransitionResponse {
                    at: *t.at.as_datetime(),
                    from: t.from,
                    to: t.to,
                })
                .collect(),
        }
    }
}

/// Relay list.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelayListResponse {
    pub relays: Vec<RelayResponse>,
    pub total: usize,
}

/// Connectivity of one ledger link.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LinkHealthResponse {
    pub reachable: bool,
    pub last_ok: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl From<LinkHealth> for LinkHealthResponse {
    fn from(l: LinkHealth) -> Self {
        Self {
            reachable: l.reachable,
            last_ok: l.last_ok.map(|t| *t.as_datetime()),
            last_error: l.last_error,
        }
    }
}

/// Relayer health.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Both ledgers reached within the staleness window.
    pub healthy: bool,
    pub permissioned: LinkHealthResponse,
    pub public: LinkHealthResponse,
    pub in_flight: usize,
    pub failed: usize,
    pub confirmed: usize,
}

impl From<HealthReport> for HealthResponse {
    fn from(h: HealthReport) -> Self {
        Self {
            healthy: h.healthy,
            permissioned: h.permissioned.into(),
            public: h.public.into(),
            in_flight: h.in_flight,
            failed: h.failed,
            confirmed: h.confirmed,
        }
    }
}

/// Relayer counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub registry_cursor: u64,
    pub proofs_generated: u64,
    pub proof_failures: u64,
    pub submissions: u64,
    pub tracked: usize,
    pub confirmed: usize,
    pub failed: usize,
}

impl From<RelayerStats> for StatsResponse {
    fn from(s: RelayerStats) -> Self {
        Self {
            registry_cursor: s.registry_cursor,
            proofs_generated: s.proofs_generated,
            proof_failures: s.proof_failures,
            submissions: s.submissions,
            tracked: s.tracked,
            confirmed: s.confirmed,
            failed: s.failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Relayer router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/relays", get(list_relays))
        .route("/v1/relays/{asset_id}", get(get_relay))
        .route("/v1/relays/{asset_id}/retry", post(retry_relay))
        .route("/v1/health", get(relayer_health))
        .route("/v1/stats", get(relayer_stats))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /v1/relays
#[utoipa::path(
    get,
    path = "/v1/relays",
    responses((status = 200, description = "Tracked assets", body = RelayListResponse)),
    tag = "relayer"
)]
pub(crate) async fn list_relays(State(state): State<AppState>) -> Json<RelayListResponse> {
    let relays: Vec<RelayResponse> = state.relayer.list().into_iter().map(Into::into).collect();
    let total = relays.len();
    Json(RelayListResponse { relays, total })
}

/// GET /v1/relays/{asset_id}
#[utoipa::path(
    get,
    path = "/v1/relays/{asset_id}",
    params(("asset_id" = u64, Path, description = "Asset identifier")),
    responses(
        (status = 200, description = "Relay status", body = RelayResponse),
        (status = 404, description = "Asset not tracked", body = crate::error::ErrorBody),
    ),
    tag = "relayer"
)]
pub(crate) async fn get_relay(
    State(state): State<AppState>,
    Path(asset_id): Path<u64>,
) -> Result<Json<RelayResponse>, AppError> {
    let record = state
        .relayer
        .status(AssetId(asset_id))
        .ok_or_else(|| AppError::NotFound(format!("asset {asset_id} is not tracked")))?;
    Ok(Json(record.into()))
}

/// POST /v1/relays/{asset_id}/retry
#[utoipa::path(
    post,
    path = "/v1/relays/{asset_id}/retry",
    params(("asset_id" = u64, Path, description = "Asset identifier")),
    responses(
        (status = 200, description = "Asset re-queued", body = RelayResponse),
        (status = 404, description = "Asset not tracked", body = crate::error::ErrorBody),
        (status = 409, description = "Asset is not failed", body = crate::error::ErrorBody),
    ),
    tag = "relayer"
)]
pub(crate) async fn retry_relay(
    State(state): State<AppState>,
    Path(asset_id): Path<u64>,
) -> Result<Json<RelayResponse>, AppError> {
    let record = state.relayer.request_retry(AssetId(asset_id))?;
    Ok(Json(record.into()))
}

/// GET /v1/health
#[utoipa::path(
    get,
    path = "/v1/health",
    responses((status = 200, description = "Relayer health", body = HealthResponse)),
    tag = "relayer"
)]
pub(crate) async fn relayer_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.relayer.health().into())
}

/// GET /v1/stats
#[utoipa::path(
    get,
    path = "/v1/stats",
    responses((status = 200, description = "Relayer counters", body = StatsResponse)),
    tag = "relayer"
)]
pub(crate) async fn relayer_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.relayer.stats().into())
}
