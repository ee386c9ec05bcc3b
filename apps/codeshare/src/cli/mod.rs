//! # CLI Module
//!
//! Command-line interface for CodeShare.
//!
//! `serve` runs the server in-process. Every other command is a client of a
//! running server and goes through `codeshare-sdk`.

mod args;
mod commands;
pub mod recent;

pub use args::{Cli, Commands, DEFAULT_SERVER_URL, ServeArgs};
pub use commands::{
    cmd_create, cmd_get, cmd_put, cmd_serve, cmd_status, cmd_watch, execute, join_error_message,
    read_content, resolve_session,
};
pub use recent::RecentSession;

use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Sdk(#[from] codeshare_sdk::Error),

    #[error(transparent)]
    Serve(#[from] crate::api::ServeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no session given and no recent session to reuse")]
    NoSession,
}
