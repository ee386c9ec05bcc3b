//! # Error Module
//!
//! Errors produced by the session store and request dispatch.
//!
//! The `Display` text of [`ShareError::SessionNotFound`] and
//! [`ShareError::InvalidRequest`] is what the HTTP API puts in its `error`
//! field, so browser clients see the same messages for every failure of a
//! given kind. The carried detail is for logs only.

use thiserror::Error;

/// Errors returned by [`crate::SessionStore`] and [`crate::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    /// No live session has this identifier (never existed or expired).
    #[error("Session not found")]
    SessionNotFound(String),

    /// The request does not describe a valid action.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Content is larger than the store accepts.
    #[error("Content too large: {size} bytes exceeds limit of {limit}")]
    ContentTooLarge { size: usize, limit: usize },

    /// The store holds the maximum number of live sessions.
    #[error("Session capacity exhausted ({limit} sessions)")]
    CapacityExhausted { limit: usize },
}

impl ShareError {
    /// Detail for logging; falls back to the display text.
    pub fn detail(&self) -> String {
        match self {
            Self::SessionNotFound(id) => format!("session '{}' not found", id),
            Self::InvalidRequest(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_messages_are_stable() {
        assert_eq!(
            ShareError::SessionNotFound("abc".into()).to_string(),
            "Session not found"
        );
        assert_eq!(
            ShareError::InvalidRequest("missing sessionId".into()).to_string(),
            "Invalid request"
        );
    }

    #[test]
    fn detail_keeps_context() {
        let err = ShareError::SessionNotFound("Ab3dE6gH".into());
        assert!(err.detail().contains("Ab3dE6gH"));

        let err = ShareError::InvalidRequest("update requires content".into());
        assert_eq!(err.detail(), "update requires content");

        let err = ShareError::ContentTooLarge { size: 10, limit: 5 };
        assert!(err.detail().contains("10 bytes"));
    }
}
