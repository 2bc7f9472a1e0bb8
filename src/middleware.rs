use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Middleware to check the admin token
///
/// When an admin token is configured, the request must carry it verbatim
/// in the `Authorization` header. Without a configured token the check is
/// skipped.
pub async fn admin_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = state.config.admin_token.as_deref() {
        let provided = headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected) {
            tracing::warn!("Rejected admin request to {}", request.uri().path());
            return Err(AppError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

/// Client identity for rate limiting: first `X-Forwarded-For` hop, or
/// `local` for direct connections.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("local")
        .to_string()
}

/// Rejects requests over the per-client budget with 429 and `Retry-After`
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(request.headers());
    if let Err(retry_after) = state.limiter.check(&key) {
        tracing::warn!("Rate limit exceeded for {}", key);
        return Err(AppError::RateLimited {
            retry_after_secs: retry_after.as_secs().max(1),
        });
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_key_uses_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "local");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "203.0.113.7");
    }
}
