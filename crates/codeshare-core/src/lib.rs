//! # CodeShare Core
//!
//! The in-memory session store behind CodeShare.
//!
//! A session is a record keyed by a short random identifier that holds the
//! latest text shared between every client polling that key. Writes are
//! last-write-wins; there is no merging.
//!
//! This crate is synchronous and clock-free: every operation receives `now`
//! as Unix milliseconds, so expiry is fully testable without sleeping.
//!
//! ## Modules
//!
//! - [`session`] - Session records and identifiers
//! - [`store`] - The session store (create/update/get/heartbeat/expiry)
//! - [`protocol`] - Wire types and request dispatch for `POST /api/share`
//! - [`error`] - Error type shared by the store and dispatch

pub mod error;
pub mod protocol;
pub mod session;
pub mod store;

pub use error::ShareError;
pub use protocol::{Action, ShareRequest, ShareResponse, dispatch};
pub use session::{SESSION_ID_LEN, Session, SessionId};
pub use store::{SessionStore, StoreConfig, StoreStats};

/// Milliseconds in one hour.
pub const HOUR_MS: u64 = 60 * 60 * 1000;

/// Sessions expire after this much inactivity unless configured otherwise.
pub const DEFAULT_TTL_MS: u64 = 24 * HOUR_MS;
