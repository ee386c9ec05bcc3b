//! CLI command implementations.

use super::recent::{self, RecentSession};
use super::{Cli, CliError, Commands, ServeArgs};
use crate::api::{self, now_millis};
use codeshare_sdk::{
    ConnectionStatus, ConnectionTracker, Error as SdkError, SessionId, SessionSync, ShareClient,
    StatusResponse, SyncEvent, SyncOptions,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Dispatch a parsed command line.
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let recent_path = cli.recent_file.clone().or_else(recent::default_path);
    let recent = recent_path.as_deref();

    match cli.command {
        Commands::Serve(args) => cmd_serve(&args).await,
        Commands::Create { content, file } => {
            let client = ShareClient::new(&cli.server);
            let content = match (content, file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path).await?,
                (None, None) => String::new(),
            };
            cmd_create(&client, content, recent).await.map(|_| ())
        }
        Commands::Get { id } => {
            let client = ShareClient::new(&cli.server);
            let content = cmd_get(&client, &id, recent).await?;
            print!("{content}");
            Ok(())
        }
        Commands::Put { id, text, file } => {
            let client = ShareClient::new(&cli.server);
            let content = read_content(text, file).await?;
            cmd_put(&client, &id, content, recent).await
        }
        Commands::Watch { id, poll_ms } => {
            let client = ShareClient::new(&cli.server);
            let options = SyncOptions {
                poll_interval: Duration::from_millis(poll_ms.max(1)),
                ..SyncOptions::default()
            };
            cmd_watch(client, id, options, recent).await
        }
        Commands::Status => {
            let client = ShareClient::new(&cli.server);
            cmd_status(&client).await.map(|_| ())
        }
    }
}

// =============================================================================
// SERVER
// =============================================================================

pub async fn cmd_serve(args: &ServeArgs) -> Result<(), CliError> {
    api::serve(args.to_config()).await?;
    Ok(())
}

// =============================================================================
// CLIENT COMMANDS
// =============================================================================

/// Create a session; prints the id and the share link.
pub async fn cmd_create(
    client: &ShareClient,
    content: String,
    recent: Option<&Path>,
) -> Result<SessionId, CliError> {
    let id = client.create(content.clone()).await?;
    println!("Session: {id}");
    println!("Link:    {}", client.share_url(&id));
    remember(recent, &id, &content);
    Ok(id)
}

/// Fetch the content of a session.
pub async fn cmd_get(
    client: &ShareClient,
    id: &str,
    recent: Option<&Path>,
) -> Result<String, CliError> {
    let id = SessionId::from(id);
    let content = client.get(&id).await?;
    remember(recent, &id, &content);
    Ok(content)
}

/// Replace the content of a session.
pub async fn cmd_put(
    client: &ShareClient,
    id: &str,
    content: String,
    recent: Option<&Path>,
) -> Result<(), CliError> {
    let id = SessionId::from(id);
    let bytes = content.len();
    client.update(&id, content.clone()).await?;
    eprintln!("Updated session {id} ({bytes} bytes)");
    remember(recent, &id, &content);
    Ok(())
}

/// Follow a session until Ctrl-C, printing content as it changes.
pub async fn cmd_watch(
    client: ShareClient,
    id: Option<String>,
    options: SyncOptions,
    recent: Option<&Path>,
) -> Result<(), CliError> {
    let id = resolve_session(id, recent, now_millis())?;
    eprintln!("Watching {} (Ctrl-C to stop)", client.share_url(&id));

    let mut tracker = ConnectionTracker::default();
    tracker.begin_connect();
    eprintln!("[{}]", tracker.status());

    let (mut sync, content) = match SessionSync::join(client, id.clone(), options).await {
        Ok(joined) => joined,
        Err(e) => {
            tracker.connect_failed(join_error_message(&e));
            eprintln!("[{}] {}", tracker.status(), tracker.error().unwrap_or_default());
            return Err(e.into());
        }
    };
    remember(recent, &id, &content);
    print_content(&content);
    eprintln!("[{}]", ConnectionStatus::Connected);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = sync.next_event() => match event {
                Some(SyncEvent::RemoteContent(content)) => {
                    remember(recent, &id, &content);
                    print_content(&content);
                }
                Some(SyncEvent::StatusChanged(status)) => eprintln!("[{status}]"),
                Some(SyncEvent::UpdateFailed(message)) => eprintln!("update failed: {message}"),
                None => break,
            },
        }
    }

    sync.shutdown().await;
    Ok(())
}

/// Print server health and store statistics.
pub async fn cmd_status(client: &ShareClient) -> Result<StatusResponse, CliError> {
    let health = client.health().await?;
    let status = client.status().await?;

    println!("Server:   {} ({}, v{})", client.base_url(), health.status, health.version);
    println!("Sessions: {}", status.sessions);
    println!("Content:  {} bytes", status.content_bytes);
    println!("Created:  {}", status.sessions_created);
    println!("Expired:  {}", status.sessions_expired);
    println!("TTL:      {}s", status.ttl_secs);
    Ok(status)
}

// =============================================================================
// HELPERS
// =============================================================================

/// Content from the argument, a file, or stdin, in that order.
pub async fn read_content(text: Option<String>, file: Option<PathBuf>) -> Result<String, CliError> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return Ok(tokio::fs::read_to_string(&path).await?);
    }
    let mut buf = String::new();
    tokio::io::stdin().read_to_string(&mut buf).await?;
    Ok(buf)
}

/// The explicit id, or else the recently used session if it is still fresh.
pub fn resolve_session(
    id: Option<String>,
    recent: Option<&Path>,
    now: u64,
) -> Result<SessionId, CliError> {
    if let Some(id) = id.filter(|id| !id.is_empty()) {
        return Ok(SessionId::from(id));
    }
    recent
        .and_then(|path| recent::load(path, now))
        .map(|r| SessionId::from(r.session_id))
        .ok_or(CliError::NoSession)
}

/// What the user is told when joining a session fails.
pub fn join_error_message(err: &SdkError) -> &'static str {
    match err {
        SdkError::NotFound(_) => "Session not found",
        e if e.is_unreachable() => "Failed to connect to server",
        _ => "Failed to join session",
    }
}

fn remember(path: Option<&Path>, id: &SessionId, content: &str) {
    let Some(path) = path else {
        return;
    };
    let record = RecentSession::new(id.as_str(), content, now_millis());
    if let Err(e) = recent::save(path, &record) {
        tracing::warn!(path = %path.display(), "could not save recent session: {}", e);
    }
}

fn print_content(content: &str) {
    println!("----");
    println!("{content}");
}
