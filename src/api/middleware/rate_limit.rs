//! Rate limiting middleware.
//!
//! One process-wide quota using the governor crate.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use governor::{Quota, RateLimiter};
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::Arc;

pub type RateLimiterState = Arc<
    RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
>;

const FALLBACK_PER_MINUTE: NonZeroU32 = NonZeroU32::new(100).unwrap();

pub fn create_rate_limiter_with_quota(requests_per_minute: u32) -> RateLimiterState {
    let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(FALLBACK_PER_MINUTE));
    Arc::new(RateLimiter::direct(quota))
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    request: Request,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!("Rate limit exceeded for request: {}", request.uri());
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "success": false, "error": "Too many requests" })),
            )
                .into_response()
        }
    }
}
