//! Mapping from failures to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use codeshare_core::{ShareError, ShareResponse};
use thiserror::Error;

/// Anything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Share(#[from] ShareError),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Too many requests")]
    RateLimited,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Share(ShareError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Share(ShareError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            Self::Share(ShareError::ContentTooLarge { .. }) | Self::PayloadTooLarge => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Share(ShareError::CapacityExhausted { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ShareResponse {
            error: Some(self.to_string()),
            ..ShareResponse::default()
        };
        (self.status(), Json(body)).into_response()
    }
}
