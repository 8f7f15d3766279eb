use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file as declared inside a torrent, read from the torrent client.
///
/// Entries are only valid until the next rename or priority change; the
/// client may re-path or renumber them, so they are re-read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub index: usize,
    /// Torrent-relative path, always `/`-separated.
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub progress: f64,
}

/// A file found on disk by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl DiskFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name, size }
    }
}

/// Summary of a torrent as listed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentInfo {
    pub hash: String,
    pub name: String,
    pub size: u64,
    pub progress: f64,
    pub state: String,
    pub save_path: String,
    pub content_path: String,
}

/// Lower-cased text after the last `.` of the final path component, or an
/// empty string when there is none.
pub fn extension_of(name: &str) -> String {
    let base = base_name(name);
    match base.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// Final component of a `/` or `\` separated path.
pub fn base_name(name: &str) -> &str {
    name.rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(name)
}
