//! # CodeShare Library
//!
//! This library exposes the CodeShare modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;

// Re-export the workspace crates for convenience
pub use codeshare_core;
pub use codeshare_sdk;
