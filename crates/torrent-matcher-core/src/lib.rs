pub mod apply;
pub mod config;
pub mod control;
pub mod error;
pub mod index;
pub mod matcher;
pub mod model;
pub mod plan;
pub mod progress;
pub mod qbittorrent;
pub mod scanner;
pub mod selection;
pub mod service;
pub mod session;

pub use apply::{ApplyOptions, ApplyReport, ClientRenamer, FilesystemRenamer, Renamer};
pub use config::AppConfig;
pub use control::{ControlPlane, FilePriority};
pub use error::Error;
pub use index::DiskIndex;
pub use matcher::{find_matches, MatchOutcome, MatchResult, MatchStatus};
pub use model::{DiskFile, ManifestEntry, TorrentInfo};
pub use plan::{plan_renames, RenameOp, RenamePlan};
pub use progress::{ProgressReporter, SilentReporter};
pub use qbittorrent::QbitClient;
pub use selection::{ResolvePolicy, SelectionState};
pub use service::MatcherService;
pub use session::{MatchSession, SessionOptions};
