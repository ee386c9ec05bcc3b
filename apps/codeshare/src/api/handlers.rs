//! Request handlers.

use super::{ApiError, SharedState, now_millis};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use codeshare_core::{Action, ShareError, ShareRequest, ShareResponse, dispatch};
use serde::{Deserialize, Serialize};

/// The collaborative editor page.
const SHARE_PAGE: &str = include_str!("share.html");

// =============================================================================
// RESPONSE TYPES
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub sessions: usize,
    pub content_bytes: usize,
    pub sessions_created: u64,
    pub sessions_expired: u64,
    pub ttl_secs: u64,
}

// =============================================================================
// HANDLERS
// =============================================================================

pub(super) async fn index() -> Redirect {
    Redirect::to("/share")
}

pub(super) async fn page() -> Html<&'static str> {
    Html(SHARE_PAGE)
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub(super) async fn status(State(state): State<SharedState>) -> Json<StatusResponse> {
    let stats = state.store.lock().await.stats();
    Json(StatusResponse {
        sessions: stats.sessions,
        content_bytes: stats.content_bytes,
        sessions_created: stats.sessions_created,
        sessions_expired: stats.sessions_expired,
        ttl_secs: state.ttl_secs,
    })
}

/// `POST /api/share`.
///
/// Any body that does not deserialize into a [`ShareRequest`] (bad JSON,
/// unknown action, wrong content type) is an invalid request.
pub(super) async fn share(
    State(state): State<SharedState>,
    payload: Result<Json<ShareRequest>, JsonRejection>,
) -> Result<Json<ShareResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge;
        }
        tracing::debug!("rejected share request: {}", rejection.body_text());
        ApiError::from(ShareError::InvalidRequest(rejection.body_text()))
    })?;

    let action = request.action;
    let session = request.session_id().map(str::to_owned);

    let result = {
        let mut store = state.store.lock().await;
        dispatch(&mut store, request, now_millis())
    };

    match &result {
        Ok(response) if action == Action::Create => {
            if let Some(id) = &response.session_id {
                tracing::info!(session = %id, "session created");
            }
        }
        Ok(_) => {
            tracing::debug!(?action, session = session.as_deref().unwrap_or("-"), "ok");
        }
        Err(e) => {
            tracing::debug!(
                ?action,
                session = session.as_deref().unwrap_or("-"),
                "share request failed: {}",
                e.detail()
            );
        }
    }

    Ok(Json(result?))
}
