use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use torrent_matcher_core::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "torrent-matcher")]
#[command(about = "Match a torrent's files to files already on disk", long_about = None)]
pub struct Cli {
    /// Read settings from this file instead of the usual locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Match a torrent's files against a directory and rename them into place
    Match(MatchArgs),
    /// List torrents known to the client
    Torrents {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// List the files of one torrent
    Files {
        /// Torrent info hash
        #[arg(long)]
        hash: String,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Print configuration values
    PrintConfig,
}

/// Overrides for the configured qBittorrent connection.
#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// qBittorrent Web UI URL, e.g. http://localhost:8080
    #[arg(long)]
    pub url: Option<String>,
    #[arg(short = 'u', long)]
    pub username: Option<String>,
    #[arg(short = 'p', long)]
    pub password: Option<String>,
}

impl ConnectionArgs {
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
    }
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    /// Torrent info hash
    #[arg(long)]
    pub hash: String,
    /// Directory to search for the torrent's files
    #[arg(long)]
    pub path: String,
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Only match files with the same extension
    #[arg(long, overrides_with = "no_same_ext")]
    pub same_ext: bool,
    /// Match on size alone
    #[arg(long, overrides_with = "same_ext")]
    pub no_same_ext: bool,
    /// Set files with no candidate on disk to "do not download"
    #[arg(long)]
    pub skip_unmatched: bool,
    /// Show the rename plan without changing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Take the first candidate for ambiguous files instead of asking
    #[arg(short = 'a', long)]
    pub auto: bool,
    /// Prefer candidates whose file name equals the torrent's file name
    #[arg(long)]
    pub prefer_name: bool,
    /// Recheck the torrent after renaming
    #[arg(short = 'r', long)]
    pub recheck: bool,
    /// Refuse plans where two renames share a source or destination
    #[arg(long)]
    pub strict: bool,
    /// Rename inside the torrent client instead of moving files on disk
    #[arg(long)]
    pub via_client: bool,
    /// Save the connection settings for next time
    #[arg(long)]
    pub save_config: bool,
}

impl MatchArgs {
    pub fn require_same_extension(&self, configured: bool) -> bool {
        if self.no_same_ext {
            false
        } else if self.same_ext {
            true
        } else {
            configured
        }
    }
}
