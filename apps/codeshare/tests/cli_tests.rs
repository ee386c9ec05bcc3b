//! Integration tests for CodeShare CLI commands.
//!
//! Client commands run against a real server bound to an ephemeral port.
//! Uses tempfile for the recent-session record.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use codeshare::api::{AppState, router};
use codeshare::cli::recent::{self, MAX_AGE_MS, RecentSession};
use codeshare::cli::{
    CliError, cmd_create, cmd_get, cmd_put, cmd_status, cmd_watch, join_error_message,
    read_content, resolve_session,
};
use codeshare::config::ServerConfig;
use codeshare_sdk::{Error as SdkError, ShareClient, SyncOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const NOW: u64 = 1_700_000_000_000;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Start a server on an ephemeral port and return a client for it.
async fn spawn_server() -> ShareClient {
    let config = ServerConfig::default();
    let state = Arc::new(AppState::new(&config));
    let app = router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ShareClient::new(format!("http://{addr}"))
}

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn recent_path(dir: &TempDir) -> PathBuf {
    dir.path().join("nested").join("session.json")
}

// =============================================================================
// CLIENT COMMAND TESTS
// =============================================================================

#[tokio::test]
async fn test_create_get_put_roundtrip() {
    let client = spawn_server().await;

    let id = cmd_create(&client, "first".into(), None).await.unwrap();
    assert_eq!(cmd_get(&client, id.as_str(), None).await.unwrap(), "first");

    cmd_put(&client, id.as_str(), "second".into(), None)
        .await
        .unwrap();
    assert_eq!(cmd_get(&client, id.as_str(), None).await.unwrap(), "second");
}

#[tokio::test]
async fn test_get_unknown_session_fails() {
    let client = spawn_server().await;

    let result = cmd_get(&client, "nosuchid", None).await;
    assert!(matches!(
        result,
        Err(CliError::Sdk(SdkError::NotFound(id))) if id == "nosuchid"
    ));
}

#[tokio::test]
async fn test_status_reports_sessions() {
    let client = spawn_server().await;
    cmd_create(&client, "abc".into(), None).await.unwrap();

    let status = cmd_status(&client).await.unwrap();
    assert_eq!(status.sessions, 1);
    assert_eq!(status.content_bytes, 3);
}

#[tokio::test]
async fn test_status_unreachable_server() {
    let client = ShareClient::new("http://127.0.0.1:9");

    let result = cmd_status(&client).await;
    assert!(matches!(result, Err(CliError::Sdk(e)) if e.is_unreachable()));
}

#[tokio::test]
async fn test_watch_unknown_session_fails() {
    let client = spawn_server().await;

    let result = cmd_watch(client, Some("nosuchid".into()), SyncOptions::default(), None).await;
    match result {
        Err(CliError::Sdk(e)) => assert_eq!(join_error_message(&e), "Session not found"),
        other => panic!("expected join failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_watch_unreachable_server_fails() {
    let client = ShareClient::new("http://127.0.0.1:9");

    let result = cmd_watch(client, Some("abcd1234".into()), SyncOptions::default(), None).await;
    match result {
        Err(CliError::Sdk(e)) => assert_eq!(join_error_message(&e), "Failed to connect to server"),
        other => panic!("expected join failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_commands_remember_recent_session() {
    let client = spawn_server().await;
    let temp = create_temp_dir();
    let path = recent_path(&temp);

    let id = cmd_create(&client, "draft".into(), Some(&path))
        .await
        .unwrap();
    let saved = recent::load(&path, codeshare::api::now_millis()).unwrap();
    assert_eq!(saved.session_id, id.as_str());
    assert_eq!(saved.content, "draft");

    cmd_put(&client, id.as_str(), "final".into(), Some(&path))
        .await
        .unwrap();
    let saved = recent::load(&path, codeshare::api::now_millis()).unwrap();
    assert_eq!(saved.content, "final");
}

// =============================================================================
// CONTENT INPUT TESTS
// =============================================================================

#[tokio::test]
async fn test_read_content_prefers_argument() {
    let temp = create_temp_dir();
    let file = temp.path().join("input.txt");
    std::fs::write(&file, "from file").unwrap();

    let text = read_content(Some("inline".into()), Some(file.clone()))
        .await
        .unwrap();
    assert_eq!(text, "inline");

    let text = read_content(None, Some(file)).await.unwrap();
    assert_eq!(text, "from file");
}

#[tokio::test]
async fn test_read_content_missing_file() {
    let temp = create_temp_dir();
    let result = read_content(None, Some(temp.path().join("missing.txt"))).await;
    assert!(matches!(result, Err(CliError::Io(_))));
}

// =============================================================================
// RECENT SESSION TESTS
// =============================================================================

#[test]
fn test_recent_save_and_load() {
    let temp = create_temp_dir();
    let path = recent_path(&temp);
    let record = RecentSession::new("abcd1234", "text", NOW);

    recent::save(&path, &record).unwrap();
    assert_eq!(recent::load(&path, NOW + 1000), Some(record));
}

#[test]
fn test_recent_missing_file() {
    let temp = create_temp_dir();
    assert_eq!(recent::load(&recent_path(&temp), NOW), None);
}

#[test]
fn test_recent_stale_record_removed() {
    let temp = create_temp_dir();
    let path = recent_path(&temp);
    recent::save(&path, &RecentSession::new("abcd1234", "", NOW)).unwrap();

    assert_eq!(recent::load(&path, NOW + MAX_AGE_MS), None);
    assert!(!path.exists());
}

#[test]
fn test_recent_corrupt_record_removed() {
    let temp = create_temp_dir();
    let path = temp.path().join("session.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert_eq!(recent::load(&path, NOW), None);
    assert!(!path.exists());
}

#[test]
fn test_resolve_session_prefers_explicit_id() {
    let temp = create_temp_dir();
    let path = recent_path(&temp);
    recent::save(&path, &RecentSession::new("recent01", "", NOW)).unwrap();

    let id = resolve_session(Some("explicit".into()), Some(&path), NOW).unwrap();
    assert_eq!(id.as_str(), "explicit");

    let id = resolve_session(None, Some(&path), NOW).unwrap();
    assert_eq!(id.as_str(), "recent01");
}

#[test]
fn test_resolve_session_without_recent() {
    let temp = create_temp_dir();

    let result = resolve_session(None, Some(&recent_path(&temp)), NOW);
    assert!(matches!(result, Err(CliError::NoSession)));

    let result = resolve_session(Some(String::new()), None, NOW);
    assert!(matches!(result, Err(CliError::NoSession)));
}
