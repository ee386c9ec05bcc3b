//! # Protocol Module
//!
//! Wire types for `POST /api/share` and the dispatch from a request to the
//! store.
//!
//! ```text
//! {"action":"create","content":""}              -> {"sessionId":"Ab3dE6gH"}
//! {"action":"update","sessionId":"..","content":".."} -> {"success":true}
//! {"action":"get","sessionId":".."}             -> {"content":".."}
//! {"action":"heartbeat","sessionId":".."}       -> {"success":true}
//! ```
//!
//! Field names are camelCase on the wire. Fields that do not apply to a
//! response are omitted rather than sent as `null`.

use crate::error::ShareError;
use crate::session::SessionId;
use crate::store::SessionStore;
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUEST
// =============================================================================

/// The four actions the share endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Get,
    Heartbeat,
}

/// Body of `POST /api/share`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ShareRequest {
    pub fn create(content: impl Into<String>) -> Self {
        Self {
            action: Action::Create,
            session_id: None,
            content: Some(content.into()),
        }
    }

    pub fn update(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            action: Action::Update,
            session_id: Some(session_id.into()),
            content: Some(content.into()),
        }
    }

    pub fn get(session_id: impl Into<String>) -> Self {
        Self {
            action: Action::Get,
            session_id: Some(session_id.into()),
            content: None,
        }
    }

    pub fn heartbeat(session_id: impl Into<String>) -> Self {
        Self {
            action: Action::Heartbeat,
            session_id: Some(session_id.into()),
            content: None,
        }
    }

    /// The session id, treating an empty string as absent.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Body returned by `POST /api/share`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShareResponse {
    pub fn created(id: SessionId) -> Self {
        Self {
            session_id: Some(id),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn success() -> Self {
        Self {
            success: Some(true),
            ..Self::default()
        }
    }

    /// Error body carrying the error's wire message.
    pub fn error(err: &ShareError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Self::default()
        }
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Apply a request to the store.
///
/// `create` must not name a session; every other action must. `update` also
/// requires `content`.
pub fn dispatch(
    store: &mut SessionStore,
    request: ShareRequest,
    now: u64,
) -> Result<ShareResponse, ShareError> {
    let ShareRequest {
        action,
        session_id,
        content,
    } = request;
    let session_id = session_id.filter(|id| !id.is_empty());

    match (action, session_id.as_deref()) {
        (Action::Create, None) => store
            .create(content.unwrap_or_default(), now)
            .map(ShareResponse::created),
        (Action::Create, Some(_)) => Err(ShareError::InvalidRequest(
            "create must not carry a sessionId".into(),
        )),
        (Action::Update, Some(id)) => {
            let content = content.ok_or_else(|| {
                ShareError::InvalidRequest("update requires content".into())
            })?;
            store.update(id, content, now)?;
            Ok(ShareResponse::success())
        }
        (Action::Get, Some(id)) => store.get(id, now).map(ShareResponse::content),
        (Action::Heartbeat, Some(id)) => {
            store.heartbeat(id, now)?;
            Ok(ShareResponse::success())
        }
        (action, None) => Err(ShareError::InvalidRequest(format!(
            "{:?} requires a sessionId",
            action
        ))),
    }
}

// =============================================================================
// TESTS
// =============================================================================
