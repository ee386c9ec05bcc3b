//! # CodeShare SDK - The Kit
//!
//! Client side of CodeShare: a typed HTTP client and the sync engine that
//! keeps a local copy of a shared session in step with the server.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use codeshare_sdk::{ShareClient, SessionSync, SyncEvent, SyncOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), codeshare_sdk::Error> {
//!     let client = ShareClient::new("http://localhost:8080");
//!
//!     let id = client.create("").await?;
//!     println!("Share this link: {}", client.share_url(&id));
//!
//!     let (mut sync, _current) = SessionSync::join(client, id, SyncOptions::default()).await?;
//!     sync.edit("hello from rust");
//!
//!     while let Some(event) = sync.next_event().await {
//!         if let SyncEvent::RemoteContent(text) = event {
//!             println!("{text}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Sync Model
//!
//! ```text
//! ┌──────────────────────┐   get every 1s        ┌──────────────────────┐
//! │   SessionSync task   │ ───────────────────►  │   CodeShare server   │
//! │                      │   heartbeat every 30s │   (apps/codeshare)   │
//! │  edit() ─► debounce  │ ───────────────────►  │                      │
//! │           300ms      │   update              │   POST /api/share    │
//! └──────────────────────┘ ───────────────────►  └──────────────────────┘
//! ```
//!
//! Last write wins on the server. The engine never merges.

mod client;
mod sync;

pub use client::{HealthResponse, ShareClient, StatusResponse};
pub use codeshare_core::SessionId;
pub use sync::{
    ConnectionStatus, ConnectionTracker, PollFailure, SessionSync, SyncEvent, SyncOptions,
};

use thiserror::Error;

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors from the CodeShare SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The session does not exist or has expired.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Server returned an error response.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Server answered successfully but without the expected field.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Whether the server could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
