//! Follow Session Example
//!
//! Creates a session, prints its share link, and echoes every change made
//! from a browser until Ctrl-C.
//!
//! Prerequisites:
//! - A CodeShare server running on localhost:8080 (`codeshare serve`)
//!
//! Run with:
//! ```sh
//! cargo run -p codeshare-sdk --example follow_session
//! ```

use codeshare_sdk::{Error, SessionSync, ShareClient, SyncEvent, SyncOptions};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let client = ShareClient::new("http://localhost:8080");

    println!("=== CodeShare SDK Follow Example ===\n");

    match client.health().await {
        Ok(health) => println!("Server {} (v{})", health.status, health.version),
        Err(e) => {
            eprintln!("Failed to connect to server: {}", e);
            eprintln!("Make sure `codeshare serve` is running on localhost:8080");
            return Err(e);
        }
    }

    let id = client.create("Hello from the SDK example!").await?;
    println!("Open {} in a browser and start typing.\n", client.share_url(&id));

    let (mut sync, _) = SessionSync::join(client, id, SyncOptions::default()).await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = sync.next_event() => match event {
                Some(SyncEvent::RemoteContent(text)) => println!("--- update ---\n{}\n", text),
                Some(SyncEvent::StatusChanged(status)) => println!("[{}]", status),
                Some(SyncEvent::UpdateFailed(reason)) => eprintln!("update failed: {}", reason),
                None => break,
            },
        }
    }

    sync.shutdown().await;
    Ok(())
}
