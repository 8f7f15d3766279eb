use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::index::DiskIndex;
use crate::model::{extension_of, DiskFile, ManifestEntry};

/// Correspondence between one manifest entry and the disk files that could be it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub manifest_entry: ManifestEntry,
    pub candidates: Vec<DiskFile>,
    pub selected: Option<DiskFile>,
    pub auto_matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Selected,
    /// Several candidates, none chosen yet.
    Ambiguous,
    Unmatched,
}

impl MatchResult {
    pub fn status(&self) -> MatchStatus {
        if self.selected.is_some() {
            MatchStatus::Selected
        } else if self.candidates.is_empty() {
            MatchStatus::Unmatched
        } else {
            MatchStatus::Ambiguous
        }
    }
}

/// Point-in-time report of a match pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub results: Vec<MatchResult>,
    /// Auto-matches only; later manual selections are not counted.
    pub matched_count: usize,
    pub total_files: usize,
}

impl MatchOutcome {
    pub fn unmatched(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.results
            .iter()
            .filter(|r| r.status() == MatchStatus::Unmatched)
            .map(|r| &r.manifest_entry)
    }

    pub fn ambiguous_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status() == MatchStatus::Ambiguous)
            .count()
    }
}

/// Match every manifest entry against the index by size and, optionally,
/// case-insensitive extension. A unique candidate is auto-selected; several
/// candidates are kept in full and left unselected. Names are never compared.
///
/// Results follow the order of `manifest`.
pub fn find_matches(
    manifest: &[ManifestEntry],
    index: &DiskIndex,
    require_same_extension: bool,
) -> MatchOutcome {
    let mut results = Vec::with_capacity(manifest.len());
    let mut matched_count = 0;

    for entry in manifest {
        let same_size = index.lookup(entry.size);

        let candidates: Vec<DiskFile> = if require_same_extension {
            let wanted = extension_of(&entry.name);
            same_size
                .iter()
                .filter(|file| extension_of(&file.name) == wanted)
                .cloned()
                .collect()
        } else {
            same_size.to_vec()
        };

        let (selected, auto_matched) = match candidates.as_slice() {
            [only] => {
                matched_count += 1;
                (Some(only.clone()), true)
            }
            _ => (None, false),
        };

        debug!(
            "{} ({} bytes): {} candidate(s){}",
            entry.name,
            entry.size,
            candidates.len(),
            if auto_matched { ", auto-matched" } else { "" }
        );

        results.push(MatchResult {
            manifest_entry: entry.clone(),
            candidates,
            selected,
            auto_matched,
        });
    }

    MatchOutcome {
        results,
        matched_count,
        total_files: manifest.len(),
    }
}
