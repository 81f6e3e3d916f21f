//! # Bearer Token Authentication
//!
//! Applied to `/v1/*` when [`ApiConfig::auth_token`](crate::state::ApiConfig)
//! is set. Health endpoints and `/metrics` are mounted outside it.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Reject requests without the configured bearer token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.auth_token.as_deref() else {
        return Ok(next.run(request).await);
    };
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    if !token_eq(presented, expected) {
        return Err(AppError::Unauthorized("invalid bearer token".to_string()));
    }
    Ok(next.run(request).await)
}

/// Constant-time token comparison. Slices of different length compare
/// unequal.
fn token_eq(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_comparison() {
        assert!(token_eq("secret", "secret"));
        assert!(!token_eq("secret", "secreT"));
        assert!(!token_eq("secret", "secret2"));
        assert!(!token_eq("", "secret"));
    }
}
