//! CLI argument definitions.

use crate::config::{
    DEFAULT_PORT, DEFAULT_RATE_LIMIT_BURST, DEFAULT_RATE_LIMIT_PER_SEC,
    DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TTL_SECS, ServerConfig,
};
use clap::{Args, Parser, Subcommand};
use codeshare_core::store::{DEFAULT_MAX_CONTENT_BYTES, DEFAULT_MAX_SESSIONS};
use std::path::PathBuf;

/// Default server URL for client commands.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// CodeShare - share text in real time through a short session link
#[derive(Parser, Debug)]
#[command(name = "codeshare")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Server URL used by client commands
    #[arg(
        long,
        global = true,
        env = "CODESHARE_URL",
        default_value = DEFAULT_SERVER_URL
    )]
    pub server: String,

    /// Where the recently used session is remembered
    #[arg(long, global = true, env = "CODESHARE_RECENT_FILE")]
    pub recent_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),

    /// Create a session and print its id and share link
    Create {
        /// Initial content
        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,

        /// Read initial content from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the content of a session
    Get {
        /// Session ID
        id: String,
    },

    /// Replace the content of a session (TEXT, --file, or stdin)
    Put {
        /// Session ID
        id: String,

        /// New content
        #[arg(conflicts_with = "file")]
        text: Option<String>,

        /// Read content from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Follow a session and print changes until Ctrl-C
    Watch {
        /// Session ID (defaults to the recently used session)
        id: Option<String>,

        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 1000)]
        poll_ms: u64,
    },

    /// Show server health and store statistics
    Status,
}

/// Flags for `codeshare serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "CODESHARE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "CODESHARE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Seconds of inactivity before a session expires
    #[arg(long, env = "CODESHARE_TTL_SECS", default_value_t = DEFAULT_TTL_SECS)]
    pub ttl_secs: u64,

    /// Seconds between expiry sweeps
    #[arg(
        long,
        env = "CODESHARE_SWEEP_INTERVAL_SECS",
        default_value_t = DEFAULT_SWEEP_INTERVAL_SECS
    )]
    pub sweep_interval_secs: u64,

    /// Maximum number of live sessions
    #[arg(long, env = "CODESHARE_MAX_SESSIONS", default_value_t = DEFAULT_MAX_SESSIONS)]
    pub max_sessions: usize,

    /// Maximum content size in bytes
    #[arg(
        long,
        env = "CODESHARE_MAX_CONTENT_BYTES",
        default_value_t = DEFAULT_MAX_CONTENT_BYTES
    )]
    pub max_content_bytes: usize,

    /// Sustained API requests per second (0 disables the limit)
    #[arg(
        long,
        env = "CODESHARE_RATE_LIMIT",
        default_value_t = DEFAULT_RATE_LIMIT_PER_SEC
    )]
    pub rate_limit: u32,

    /// API request burst size
    #[arg(
        long,
        env = "CODESHARE_RATE_LIMIT_BURST",
        default_value_t = DEFAULT_RATE_LIMIT_BURST
    )]
    pub rate_limit_burst: u32,
}

impl ServeArgs {
    pub fn to_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            ttl_secs: self.ttl_secs,
            sweep_interval_secs: self.sweep_interval_secs,
            max_sessions: self.max_sessions,
            max_content_bytes: self.max_content_bytes,
            rate_limit_per_sec: self.rate_limit,
            rate_limit_burst: self.rate_limit_burst,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults_match_server_config() {
        let cli = Cli::try_parse_from(["codeshare", "serve"]);
        let Ok(Cli {
            command: Commands::Serve(args),
            ..
        }) = cli
        else {
            panic!("serve should parse");
        };
        assert_eq!(args.to_config(), ServerConfig::default());
    }

    #[test]
    fn put_text_and_file_conflict() {
        let cli = Cli::try_parse_from(["codeshare", "put", "abc", "text", "--file", "x.txt"]);
        assert!(cli.is_err());
    }

    #[test]
    fn watch_id_is_optional() {
        let cli = Cli::try_parse_from(["codeshare", "watch", "--poll-ms", "250"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Watch {
                id: None,
                poll_ms: 250
            })
        ));
    }
}
