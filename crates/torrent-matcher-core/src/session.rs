use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::apply::{self, ApplyOptions, ApplyReport, Renamer};
use crate::control::ControlPlane;
use crate::error::Error;
use crate::index::DiskIndex;
use crate::matcher::{find_matches, MatchOutcome, MatchStatus};
use crate::model::{DiskFile, ManifestEntry};
use crate::plan::{plan_renames_into, RenamePlan};
use crate::progress::ProgressReporter;
use crate::scanner::{self, DirectoryScan};
use crate::selection::{ResolvePolicy, SelectionState};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub require_same_extension: bool,
    pub ignore_patterns: Vec<String>,
    pub apply: ApplyOptions,
    /// Where the torrent's files should end up. Defaults to the scan root.
    pub content_root: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            require_same_extension: true,
            ignore_patterns: Vec::new(),
            apply: ApplyOptions::default(),
            content_root: None,
        }
    }
}

/// One matching workflow for one torrent against one directory.
///
/// Every control-plane mutation (apply, skip) re-reads the manifest and
/// rescans, which discards selection edits and bumps the generation so that
/// earlier plans are refused.
pub struct MatchSession<'c, C: ControlPlane + ?Sized> {
    client: &'c C,
    torrent_id: String,
    search_path: String,
    options: SessionOptions,
    manifest: Vec<ManifestEntry>,
    scan: DirectoryScan,
    outcome: MatchOutcome,
    selections: SelectionState,
    generation: u64,
    stale: bool,
}

impl<'c, C: ControlPlane + ?Sized> MatchSession<'c, C> {
    /// Validate the search path, scan it, read the manifest and match.
    pub fn open(
        client: &'c C,
        torrent_id: &str,
        search_path: &str,
        options: SessionOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<Self, Error> {
        let (manifest, scan, outcome) =
            load(client, torrent_id, search_path, &options, reporter)?;
        let selections = SelectionState::from_outcome(&outcome);

        Ok(Self {
            client,
            torrent_id: torrent_id.to_string(),
            search_path: search_path.to_string(),
            options,
            manifest,
            scan,
            outcome,
            selections,
            generation: 0,
            stale: false,
        })
    }

    /// Re-read the manifest, rescan and rematch from scratch.
    pub fn refresh(&mut self, reporter: &dyn ProgressReporter) -> Result<(), Error> {
        let (manifest, scan, outcome) = load(
            self.client,
            &self.torrent_id,
            &self.search_path,
            &self.options,
            reporter,
        )?;
        self.selections = SelectionState::from_outcome(&outcome);
        self.manifest = manifest;
        self.scan = scan;
        self.outcome = outcome;
        self.generation += 1;
        self.stale = false;
        debug!("Session refreshed, generation {}", self.generation);
        Ok(())
    }

    pub fn torrent_id(&self) -> &str {
        &self.torrent_id
    }

    pub fn scan_root(&self) -> &Path {
        &self.scan.root
    }

    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    pub fn scan(&self) -> &DirectoryScan {
        &self.scan
    }

    /// The matcher's report for the current generation, unaffected by edits.
    pub fn outcome(&self) -> &MatchOutcome {
        &self.outcome
    }

    pub fn selections(&self) -> &SelectionState {
        &self.selections
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn select(&mut self, position: usize, file: DiskFile) {
        self.selections = std::mem::take(&mut self.selections).select(position, file);
    }

    pub fn clear(&mut self, position: usize) {
        self.selections = std::mem::take(&mut self.selections).clear(position);
    }

    pub fn resolve(&mut self, policy: ResolvePolicy) {
        self.selections = std::mem::take(&mut self.selections).resolve(policy);
    }

    /// Replace the selections wholesale, e.g. to restore an earlier snapshot.
    pub fn set_selections(&mut self, selections: SelectionState) {
        self.selections = selections;
    }

    pub fn plan(&self) -> Result<RenamePlan, Error> {
        if self.stale {
            return Err(Error::NeedsRefresh);
        }
        let content_root = self
            .options
            .content_root
            .as_deref()
            .unwrap_or(&self.scan.root);
        Ok(RenamePlan {
            ops: plan_renames_into(self.selections.results(), &self.scan.root, content_root),
            generation: self.generation,
        })
    }

    /// Apply `plan` and reload. Plans from an earlier generation are refused
    /// without touching anything.
    ///
    /// The report is returned even when the reload fails; the session then
    /// stays stale until `refresh` succeeds.
    pub fn apply(
        &mut self,
        plan: &RenamePlan,
        renamer: &dyn Renamer,
        reporter: &dyn ProgressReporter,
    ) -> Result<ApplyReport, Error> {
        self.ensure_current(plan)?;

        let report = apply::apply_with(&plan.ops, renamer, self.options.apply, reporter)?;
        self.mark_changed();
        self.reload_after_change(reporter);
        Ok(report)
    }

    /// Entries with no candidate on disk, in manifest order.
    pub fn unmatched_entries(&self) -> Vec<&ManifestEntry> {
        self.selections
            .results()
            .iter()
            .filter(|r| r.status() == MatchStatus::Unmatched)
            .map(|r| &r.manifest_entry)
            .collect()
    }

    /// Set every entry with no candidate on disk to "do not download", then
    /// reload. A failed reload leaves the session stale, as in `apply`.
    pub fn skip_unmatched(&mut self, reporter: &dyn ProgressReporter) -> Result<usize, Error> {
        let unmatched = self.selections.unmatched_indices();
        let skipped = apply::skip_unmatched(self.client, &self.torrent_id, &unmatched)?;
        if skipped > 0 {
            self.mark_changed();
            self.reload_after_change(reporter);
        }
        Ok(skipped)
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn trigger_recheck(&self) -> Result<(), Error> {
        apply::trigger_recheck(self.client, &self.torrent_id)
    }

    fn ensure_current(&self, plan: &RenamePlan) -> Result<(), Error> {
        if self.stale {
            return Err(Error::NeedsRefresh);
        }
        if plan.generation != self.generation {
            return Err(Error::StalePlan {
                plan: plan.generation,
                current: self.generation,
            });
        }
        Ok(())
    }

    fn mark_changed(&mut self) {
        self.generation += 1;
        self.stale = true;
    }

    fn reload_after_change(&mut self, reporter: &dyn ProgressReporter) {
        if let Err(e) = self.refresh(reporter) {
            warn!("Reload after changing torrent {} failed: {}", self.torrent_id, e);
        }
    }
}

fn load<C: ControlPlane + ?Sized>(
    client: &C,
    torrent_id: &str,
    search_path: &str,
    options: &SessionOptions,
    reporter: &dyn ProgressReporter,
) -> Result<(Vec<ManifestEntry>, DirectoryScan, MatchOutcome), Error> {
    let scan = scanner::scan_directory(search_path, &options.ignore_patterns, reporter)?;

    let mut manifest = client.torrent_files(torrent_id)?;
    manifest.sort_by_key(|e| e.index);

    let index = DiskIndex::build(&scan.files);
    let outcome = find_matches(&manifest, &index, options.require_same_extension);
    info!(
        "Matched {}/{} torrent files against {} files on disk ({} ambiguous)",
        outcome.matched_count,
        outcome.total_files,
        index.total_files(),
        outcome.ambiguous_count()
    );
    reporter.on_match_complete(outcome.matched_count, outcome.total_files);

    Ok((manifest, scan, outcome))
}
