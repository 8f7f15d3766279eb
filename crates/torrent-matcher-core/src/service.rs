use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;
use crate::index::DiskIndex;
use crate::matcher::{find_matches, MatchResult};
use crate::model::{DiskFile, ManifestEntry};
use crate::plan::{plan_renames, RenameOp};
use crate::progress::SilentReporter;
use crate::scanner;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesRequest {
    pub manifest: Vec<ManifestEntry>,
    pub disk_files: Vec<DiskFile>,
    #[serde(default = "default_true")]
    pub require_same_extension: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesResponse {
    pub results: Vec<MatchResult>,
    pub unmatched: Vec<ManifestEntry>,
    pub matched_count: usize,
    pub total_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRenamesRequest {
    pub selections: Vec<MatchResult>,
    pub scan_root: PathBuf,
}

/// Stateless request/response surface for a presentation layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatcherService;

impl MatcherService {
    pub fn find_matches(&self, request: FindMatchesRequest) -> FindMatchesResponse {
        let index = DiskIndex::build(&request.disk_files);
        let outcome = find_matches(&request.manifest, &index, request.require_same_extension);
        let unmatched = outcome.unmatched().cloned().collect();
        FindMatchesResponse {
            results: outcome.results,
            unmatched,
            matched_count: outcome.matched_count,
            total_files: outcome.total_files,
        }
    }

    /// `scan_root` is resolved the way `scan_directory` resolves it, so a
    /// relative, `~` or symlinked root still recognises files already in place.
    pub fn generate_renames(&self, request: GenerateRenamesRequest) -> Vec<RenameOp> {
        let scan_root = scanner::resolve_root(&request.scan_root);
        plan_renames(&request.selections, &scan_root)
    }

    pub fn scan_directory(&self, path: &str, ignore_patterns: &[String]) -> Result<Vec<DiskFile>, Error> {
        Ok(scanner::scan_directory(path, ignore_patterns, &SilentReporter)?.files)
    }

    pub fn directory_exists(&self, path: &str) -> bool {
        !path.trim().is_empty() && scanner::directory_exists(&scanner::expand_home(path.trim()))
    }
}
