//! # OpenAPI Document
//!
//! Served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Required on /v1/* when the API is started with a token."))
                        .build(),
                ),
            );
        }
    }
}

/// API document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Approval-Mint Bridge API",
        description = "Relayer status and health for the approval-to-mint bridge, plus read-only queries against the approval registry and mint gate.\n\nHealth probes (`/health/*`) and `/metrics` are unauthenticated."
    ),
    paths(
        crate::routes::relays::list_relays,
        crate::routes::relays::get_relay,
        crate::routes::relays::retry_relay,
        crate::routes::relays::relayer_health,
        crate::routes::relays::relayer_stats,
        crate::routes::ledgers::get_approval_state,
        crate::routes::ledgers::get_mint_status,
        crate::routes::ledgers::get_balance,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::relays::RelayResponse,
        crate::routes::relays::PhaseTransitionResponse,
        crate::routes::relays::RelayListResponse,
        crate::routes::relays::LinkHealthResponse,
        crate::routes::relays::HealthResponse,
        crate::routes::relays::StatsResponse,
        crate::routes::ledgers::ApprovalStateResponse,
        crate::routes::ledgers::MintStatusResponse,
        crate::routes::ledgers::BalanceResponse,
    )),
    modifiers(&SecurityAddon),
    security(("bearer_auth" = [])),
    tags(
        (name = "relayer", description = "Relay saga status and operator actions"),
        (name = "ledgers", description = "Read-only ledger queries"),
    )
)]
pub struct ApiDoc;

/// Router serving the document.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/v1/relays",
            "/v1/relays/{asset_id}",
            "/v1/relays/{asset_id}/retry",
            "/v1/health",
            "/v1/stats",
            "/v1/approvals/{asset_id}",
            "/v1/mints/{asset_id}",
            "/v1/mints/{asset_id}/balance/{owner}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert!(doc.components.unwrap().security_schemes.contains_key("bearer_auth"));
    }
}
