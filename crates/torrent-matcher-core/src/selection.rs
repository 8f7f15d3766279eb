use ahash::AHashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::matcher::{MatchOutcome, MatchResult, MatchStatus};
use crate::model::{base_name, DiskFile};

/// How to settle ambiguous results without asking the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvePolicy {
    /// Take the first candidate in scan order.
    FirstCandidate,
    /// Take the candidate whose file name equals the manifest entry's file
    /// name, ignoring case. Entries with no such candidate stay ambiguous.
    ExactName,
}

/// User-editable view over a match pass.
///
/// Edits consume the snapshot and return the next one. A snapshot that is
/// still shared (e.g. kept as history) is copied on write, otherwise the
/// edit is done in place.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    results: Arc<Vec<MatchResult>>,
    baseline: Arc<Vec<Option<DiskFile>>>,
}

impl SelectionState {
    pub fn new(results: Vec<MatchResult>) -> Self {
        let baseline = results.iter().map(|r| r.selected.clone()).collect();
        Self {
            results: Arc::new(results),
            baseline: Arc::new(baseline),
        }
    }

    pub fn from_outcome(outcome: &MatchOutcome) -> Self {
        Self::new(outcome.results.clone())
    }

    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    pub fn get(&self, position: usize) -> Option<&MatchResult> {
        self.results.get(position)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Panics if `position` is out of range.
    pub fn status(&self, position: usize) -> MatchStatus {
        self.results[position].status()
    }

    /// Choose `file` for the result at `position`. `file` need not be one of
    /// the detected candidates. Panics if `position` is out of range.
    pub fn select(mut self, position: usize, file: DiskFile) -> Self {
        let result = self.result_mut(position);
        result.selected = Some(file);
        result.auto_matched = false;
        self
    }

    /// Drop any selection at `position`. Panics if `position` is out of range.
    pub fn clear(mut self, position: usize) -> Self {
        let result = self.result_mut(position);
        result.selected = None;
        result.auto_matched = false;
        self
    }

    /// Apply `policy` to every ambiguous result. Selected and unmatched
    /// results are left alone.
    pub fn resolve(mut self, policy: ResolvePolicy) -> Self {
        let choices: Vec<(usize, DiskFile)> = self
            .results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status() == MatchStatus::Ambiguous)
            .filter_map(|(position, r)| pick(r, policy).map(|file| (position, file.clone())))
            .collect();

        for (position, file) in choices {
            self = self.select(position, file);
        }
        self
    }

    /// True when the selection at `position` differs from the matcher's own decision.
    pub fn is_dirty(&self, position: usize) -> bool {
        self.results[position].selected != self.baseline[position]
    }

    pub fn dirty_indices(&self) -> Vec<usize> {
        (0..self.results.len()).filter(|&p| self.is_dirty(p)).collect()
    }

    pub fn selected_count(&self) -> usize {
        self.results.iter().filter(|r| r.selected.is_some()).count()
    }

    /// Manifest indices of entries that have no candidate on disk.
    pub fn unmatched_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| r.status() == MatchStatus::Unmatched)
            .map(|r| r.manifest_entry.index)
            .collect()
    }

    /// Disk files chosen by more than one entry, with the positions choosing them.
    pub fn duplicate_selections(&self) -> Vec<(PathBuf, Vec<usize>)> {
        let mut by_path: AHashMap<&PathBuf, Vec<usize>> = AHashMap::new();
        let mut order: Vec<&PathBuf> = Vec::new();

        for (position, result) in self.results.iter().enumerate() {
            if let Some(file) = &result.selected {
                let positions = by_path.entry(&file.path).or_default();
                if positions.is_empty() {
                    order.push(&file.path);
                }
                positions.push(position);
            }
        }

        order
            .into_iter()
            .filter_map(|path| {
                let positions = by_path.remove(path)?;
                (positions.len() > 1).then(|| (path.clone(), positions))
            })
            .collect()
    }

    pub fn into_results(self) -> Vec<MatchResult> {
        Arc::try_unwrap(self.results).unwrap_or_else(|shared| (*shared).clone())
    }

    fn result_mut(&mut self, position: usize) -> &mut MatchResult {
        let len = self.results.len();
        assert!(
            position < len,
            "selection position {} out of range ({} results)",
            position,
            len
        );
        &mut Arc::make_mut(&mut self.results)[position]
    }
}

fn pick(result: &MatchResult, policy: ResolvePolicy) -> Option<&DiskFile> {
    match policy {
        ResolvePolicy::FirstCandidate => result.candidates.first(),
        ResolvePolicy::ExactName => {
            let wanted = base_name(&result.manifest_entry.name).to_lowercase();
            result
                .candidates
                .iter()
                .find(|c| c.name.to_lowercase() == wanted)
        }
    }
}
