use crate::error::Error;
use crate::model::{ManifestEntry, TorrentInfo};

/// Download priority of a single torrent file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilePriority {
    Skip = 0,
    Normal = 1,
    High = 6,
    Maximum = 7,
}

impl FilePriority {
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// Operations the matcher needs from a torrent client session.
///
/// Implementations hold their own session state; callers pass the handle
/// explicitly. Every call is a single bounded request.
pub trait ControlPlane {
    fn app_version(&self) -> Result<String, Error>;

    fn torrents(&self) -> Result<Vec<TorrentInfo>, Error>;

    /// Files of one torrent, in ascending index order.
    fn torrent_files(&self, torrent_id: &str) -> Result<Vec<ManifestEntry>, Error>;

    /// Point the torrent entry `old_path` at `new_path` (both torrent-relative).
    fn rename_file(&self, torrent_id: &str, old_path: &str, new_path: &str) -> Result<(), Error>;

    /// `file_ids` is a comma-joined list of manifest indices, e.g. `"0,3,4"`.
    fn set_file_priority(
        &self,
        torrent_id: &str,
        file_ids: &str,
        priority: FilePriority,
    ) -> Result<(), Error>;

    fn recheck_torrent(&self, torrent_id: &str) -> Result<(), Error>;
}

/// Comma-joined manifest indices as taken by `set_file_priority`.
pub fn join_file_ids(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
