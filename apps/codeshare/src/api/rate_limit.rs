//! Global token-bucket limit on API requests.

use super::{ApiError, SharedState};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

pub(super) async fn limit_requests(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
            return ApiError::RateLimited.into_response();
        }
    }
    next.run(request).await
}
