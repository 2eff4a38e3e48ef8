//! Response hardening and the catch-all request rate limit.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared_error::AppError;
use shared_rate_limit::RateCategory;

use crate::client_context::ClientContext;
use crate::AppState;

/// Security headers attached to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'self'"),
    );

    response
}

/// Catch-all sliding window: keyed by the authenticated user when the
/// bearer token verifies, by hashed client address otherwise. Sets
/// `X-RateLimit-Remaining` on every response it lets through.
pub async fn api_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .and_then(|token| shared_jwt::decode_access_jwt(token, &state.jwt_secret).ok())
        .map(|claims| claims.sub.to_string())
        .unwrap_or_else(|| {
            ClientContext::from_request(request.headers(), None).rate_key("anonymous")
        });

    let result = match state
        .rate_gate
        .check_and_record(RateCategory::ApiDefault, &key)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Rate gate failure: {}", e);
            return next.run(request).await;
        },
    };

    if !result.allowed {
        return AppError::RateLimited(result.retry_after).into_response();
    }

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&result.remaining.to_string()) {
        response.headers_mut().insert("x-ratelimit-remaining", value);
    }
    response
}
