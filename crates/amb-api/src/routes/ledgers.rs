//! # Ledger Query Routes
//!
//! Read-only views of the two ledgers, available when the API shares a
//! process with them. Writes go through the ledgers' own transaction paths,
//! never through this API.
//!
//! - `GET /v1/approvals/{asset_id}`: registry approval state
//! - `GET /v1/mints/{asset_id}`: mint gate record
//! - `GET /v1/mints/{asset_id}/balance/{owner}`: `balanceOf(owner, asset)`

use std::sync::Arc;

use amb_core::{Address, AssetId};
use amb_mint::MintGate;
use amb_registry::ApprovalRegistry;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// Approval state of one asset.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApprovalStateResponse {
    pub asset_id: u64,
    pub role_a: bool,
    pub role_b: bool,
    pub role_c: bool,
    pub aggregated: bool,
}

/// Mint state of one asset.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MintStatusResponse {
    pub asset_id: u64,
    pub minted: bool,
    /// `0x`-prefixed owner address.
    pub owner: Option<String>,
    pub proof_fingerprint: Option<String>,
    pub minted_at_block: Option<u64>,
}

/// Balance of one owner for one asset.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub asset_id: u64,
    pub owner: String,
    pub balance: u64,
}

/// Ledger query router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/approvals/{asset_id}", get(get_approval_state))
        .route("/v1/mints/{asset_id}", get(get_mint_status))
        .route("/v1/mints/{asset_id}/balance/{owner}", get(get_balance))
}

fn registry(state: &AppState) -> Result<&Arc<ApprovalRegistry>, AppError> {
    state
        .registry
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("approval registry not attached".to_string()))
}

fn gate(state: &AppState) -> Result<&Arc<MintGate>, AppError> {
    state
        .gate
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("mint gate not attached".to_string()))
}

/// GET /v1/approvals/{asset_id}
#[utoipa::path(
    get,
    path = "/v1/approvals/{asset_id}",
    params(("asset_id" = u64, Path, description = "Asset identifier")),
    responses(
        (status = 200, description = "Approval state", body = ApprovalStateResponse),
        (status = 503, description = "Registry not attached", body = crate::error::ErrorBody),
    ),
    tag = "ledgers"
)]
pub(crate) async fn get_approval_state(
    State(state): State<AppState>,
    Path(asset_id): Path<u64>,
) -> Result<Json<ApprovalStateResponse>, AppError> {
    let record = registry(&state)?.get_approval_state(AssetId(asset_id));
    Ok(Json(ApprovalStateResponse {
        asset_id,
        role_a: record.role_a,
        role_b: record.role_b,
        role_c: record.role_c,
        aggregated: record.aggregated,
    }))
}

/// GET /v1/mints/{asset_id}
#[utoipa::path(
    get,
    path = "/v1/mints/{asset_id}",
    params(("asset_id" = u64, Path, description = "Asset identifier")),
    responses(
        (status = 200, description = "Mint state", body = MintStatusResponse),
        (status = 503, description = "Mint gate not attached", body = crate::error::ErrorBody),
    ),
    tag = "ledgers"
)]
pub(crate) async fn get_mint_status(
    State(state): State<AppState>,
    Path(asset_id): Path<u64>,
) -> Result<Json<MintStatusResponse>, AppError> {
    let record = gate(&state)?.record(AssetId(asset_id));
    Ok(Json(MintStatusResponse {
        asset_id,
        minted: record.minted,
        owner: record.owner.map(|a| a.to_hex()),
        proof_fingerprint: record.proof_fingerprint.map(|d| d.to_string()),
        minted_at_block: record.minted_at_block,
    }))
}

/// GET /v1/mints/{asset_id}/balance/{owner}
#[utoipa::path(
    get,
    path = "/v1/mints/{asset_id}/balance/{owner}",
    params(
        ("asset_id" = u64, Path, description = "Asset identifier"),
        ("owner" = String, Path, description = "0x-prefixed owner address"),
    ),
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 422, description = "Malformed address", body = crate::error::ErrorBody),
        (status = 503, description = "Mint gate not attached", body = crate::error::ErrorBody),
    ),
    tag = "ledgers"
)]
pub(crate) async fn get_balance(
    State(state): State<AppState>,
    Path((asset_id, owner)): Path<(u64, String)>,
) -> Result<Json<BalanceResponse>, AppError> {
    let gate = gate(&state)?;
    let owner = Address::from_hex(&owner)?;
    Ok(Json(BalanceResponse {
        asset_id,
        owner: owner.to_hex(),
        balance: gate.balance_of(owner, AssetId(asset_id)),
    }))
}
