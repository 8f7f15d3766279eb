use reqwest::blocking::{Client, Response};
use reqwest::header::REFERER;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::control::{ControlPlane, FilePriority};
use crate::error::Error;
use crate::model::{ManifestEntry, TorrentInfo};

/// qBittorrent Web API v2 session. The SID cookie from `login` is kept in
/// the client's cookie store; each request is bounded by the configured timeout.
pub struct QbitClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct WireTorrent {
    hash: String,
    name: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    state: String,
    #[serde(default)]
    save_path: String,
    #[serde(default)]
    content_path: String,
}

#[derive(Debug, Deserialize)]
struct WireFile {
    /// Missing on servers older than API 2.8.2; position is the index there.
    #[serde(default)]
    index: Option<usize>,
    name: String,
    size: i64,
    #[serde(default)]
    progress: f64,
}

impl QbitClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, Error> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a client from the configured URL and log in with the configured credentials.
    pub fn connect(config: &AppConfig) -> Result<Self, Error> {
        if config.url.trim().is_empty() {
            return Err(Error::Other("torrent client URL is not set".to_string()));
        }
        let client = Self::new(&config.url, config.request_timeout())?;
        client.login(&config.username, &config.password)?;
        Ok(client)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<(), Error> {
        info!("Logging in to {}", self.base_url);
        let response = self
            .http
            .post(self.endpoint("auth/login"))
            .header(REFERER, &self.base_url)
            .form(&[("username", username), ("password", password)])
            .send()?;
        let response = check("login", response)?;
        let body = response.text()?;
        if body.trim() != "Ok." {
            return Err(Error::LoginFailed);
        }
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path)
    }

    fn post_form(&self, action: &'static str, path: &str, form: &[(&str, &str)]) -> Result<(), Error> {
        let response = self.http.post(self.endpoint(path)).form(form).send()?;
        check(action, response)?;
        Ok(())
    }
}

fn check(action: &'static str, response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(Error::Rejected {
        action,
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

fn manifest_from_wire(files: Vec<WireFile>) -> Vec<ManifestEntry> {
    let mut manifest: Vec<ManifestEntry> = files
        .into_iter()
        .enumerate()
        .map(|(position, f)| ManifestEntry {
            index: f.index.unwrap_or(position),
            name: f.name,
            size: f.size.max(0) as u64,
            progress: f.progress.clamp(0.0, 1.0),
        })
        .collect();
    manifest.sort_by_key(|e| e.index);
    manifest
}

fn torrent_from_wire(t: WireTorrent) -> TorrentInfo {
    TorrentInfo {
        hash: t.hash,
        name: t.name,
        size: t.size.max(0) as u64,
        progress: t.progress,
        state: t.state,
        save_path: t.save_path,
        content_path: t.content_path,
    }
}

impl ControlPlane for QbitClient {
    fn app_version(&self) -> Result<String, Error> {
        let response = self.http.get(self.endpoint("app/version")).send()?;
        Ok(check("app/version", response)?.text()?.trim().to_string())
    }

    fn torrents(&self) -> Result<Vec<TorrentInfo>, Error> {
        let response = self.http.get(self.endpoint("torrents/info")).send()?;
        let torrents: Vec<WireTorrent> = check("torrents/info", response)?.json()?;
        Ok(torrents.into_iter().map(torrent_from_wire).collect())
    }

    fn torrent_files(&self, torrent_id: &str) -> Result<Vec<ManifestEntry>, Error> {
        let response = self
            .http
            .get(self.endpoint("torrents/files"))
            .query(&[("hash", torrent_id)])
            .send()?;
        // The server answers `null` rather than `[]` for torrents without metadata
        let files: Option<Vec<WireFile>> = check("torrents/files", response)?.json()?;
        let manifest = manifest_from_wire(files.unwrap_or_default());
        debug!("Torrent {} has {} files", torrent_id, manifest.len());
        Ok(manifest)
    }

    fn rename_file(&self, torrent_id: &str, old_path: &str, new_path: &str) -> Result<(), Error> {
        self.post_form(
            "renameFile",
            "torrents/renameFile",
            &[("hash", torrent_id), ("oldPath", old_path), ("newPath", new_path)],
        )
    }

    fn set_file_priority(
        &self,
        torrent_id: &str,
        file_ids: &str,
        priority: FilePriority,
    ) -> Result<(), Error> {
        let ids = file_ids.replace(',', "|");
        let level = priority.level().to_string();
        self.post_form(
            "filePrio",
            "torrents/filePrio",
            &[("hash", torrent_id), ("id", ids.as_str()), ("priority", level.as_str())],
        )
    }

    fn recheck_torrent(&self, torrent_id: &str) -> Result<(), Error> {
        self.post_form("recheck", "torrents/recheck", &[("hashes", torrent_id)])
    }
}
