//! # Request Metrics
//!
//! Records `amb_api_requests_total` and `amb_api_request_duration_seconds`
//! through the global `metrics` recorder. Numeric path segments are folded
//! into `{id}` so asset ids do not explode label cardinality.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let numeric = !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit());
            let address = segment.len() == 42
                && segment.starts_with("0x")
                && segment[2..].bytes().all(|b| b.is_ascii_hexdigit());
            if numeric || address {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware that records request count and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        "amb_api_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "amb_api_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_ids_are_folded() {
        assert_eq!(normalize_path("/v1/relays/42"), "/v1/relays/{id}");
        assert_eq!(normalize_path("/v1/relays/42/retry"), "/v1/relays/{id}/retry");
    }

    #[test]
    fn addresses_are_folded() {
        let path = format!("/v1/mints/7/balance/0x{}", "ab".repeat(20));
        assert_eq!(normalize_path(&path), "/v1/mints/{id}/balance/{id}");
    }

    #[test]
    fn static_segments_are_kept() {
        assert_eq!(normalize_path("/v1/health"), "/v1/health");
        assert_eq!(normalize_path("/"), "/");
    }
}
