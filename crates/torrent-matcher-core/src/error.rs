use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to serialize configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Request to torrent client failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Torrent client rejected {action}: HTTP {status} {body}")]
    Rejected {
        action: &'static str,
        status: u16,
        body: String,
    },

    #[error("Login to torrent client failed")]
    LoginFailed,

    #[error("Search path is empty")]
    EmptyPath,

    #[error("Directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Rename plan is stale (built for generation {plan}, current is {current})")]
    StalePlan { plan: u64, current: u64 },

    #[error("Torrent state changed and has not been reloaded yet")]
    NeedsRefresh,

    #[error("Rename plan has {0} conflicting operation(s)")]
    PlanConflicts(usize),

    #[error("{0}")]
    Other(String),
}
