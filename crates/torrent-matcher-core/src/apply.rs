use serde::Serialize;
use std::fs;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::control::{join_file_ids, ControlPlane, FilePriority};
use crate::error::Error;
use crate::plan::{find_conflicts, RenameOp};
use crate::progress::ProgressReporter;

/// Carries out a single rename.
pub trait Renamer {
    fn rename(&self, op: &RenameOp) -> Result<(), Error>;
}

/// Moves the disk file into the manifest layout. Parent directories are
/// created; an existing destination is never overwritten.
pub struct FilesystemRenamer;

impl Renamer for FilesystemRenamer {
    fn rename(&self, op: &RenameOp) -> Result<(), Error> {
        if op.new_path.exists() {
            return Err(Error::Other(format!(
                "destination already exists: {}",
                op.new_path.display()
            )));
        }
        if let Some(parent) = op.new_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&op.old_path, &op.new_path)?;
        Ok(())
    }
}

/// Asks the torrent client to point the manifest entry at the file's current
/// location, relative to the scan root. Requires the scan root to be the
/// torrent's save path.
pub struct ClientRenamer<'a, C: ControlPlane + ?Sized> {
    client: &'a C,
    torrent_id: &'a str,
}

impl<'a, C: ControlPlane + ?Sized> ClientRenamer<'a, C> {
    pub fn new(client: &'a C, torrent_id: &'a str) -> Self {
        Self { client, torrent_id }
    }
}

impl<C: ControlPlane + ?Sized> Renamer for ClientRenamer<'_, C> {
    fn rename(&self, op: &RenameOp) -> Result<(), Error> {
        let Some(relative) = &op.relative_source else {
            return Err(Error::Other(format!(
                "{} is outside the scan root",
                op.old_path.display()
            )));
        };
        self.client
            .rename_file(self.torrent_id, &op.manifest_name, relative)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyFailure {
    pub op: RenameOp,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<ApplyFailure>,
    #[serde(skip)]
    pub duration: Duration,
}

impl ApplyReport {
    pub fn total(&self) -> usize {
        self.success_count + self.failure_count
    }

    pub fn any_applied(&self) -> bool {
        self.success_count > 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Refuse the whole batch if two operations share a source or destination.
    pub reject_conflicts: bool,
}

/// Run `ops` one after another in order. A failing rename is recorded and the
/// batch moves on; completed renames are never rolled back.
pub fn apply_renames<F>(ops: &[RenameOp], mut rename: F, reporter: &dyn ProgressReporter) -> ApplyReport
where
    F: FnMut(&RenameOp) -> Result<(), Error>,
{
    let start = Instant::now();
    let mut report = ApplyReport::default();
    reporter.on_apply_start(ops.len());

    for (done, op) in ops.iter().enumerate() {
        match rename(op) {
            Ok(()) => {
                debug!("renamed: {} -> {}", op.old_path.display(), op.new_path.display());
                report.success_count += 1;
            }
            Err(e) => {
                warn!("Failed to rename {}: {}", op.old_path.display(), e);
                report.failure_count += 1;
                report.failures.push(ApplyFailure {
                    op: op.clone(),
                    error: e.to_string(),
                });
            }
        }
        reporter.on_apply_progress(done + 1, ops.len(), op);
    }

    report.duration = start.elapsed();
    info!(
        "Rename plan executed: {} succeeded, {} failed",
        report.success_count, report.failure_count
    );
    reporter.on_apply_complete(
        report.success_count,
        report.failure_count,
        report.duration.as_secs_f64(),
    );
    report
}

/// `apply_renames` through a `Renamer`, after the optional conflict check.
pub fn apply_with(
    ops: &[RenameOp],
    renamer: &dyn Renamer,
    options: ApplyOptions,
    reporter: &dyn ProgressReporter,
) -> Result<ApplyReport, Error> {
    if options.reject_conflicts {
        let conflicts = find_conflicts(ops);
        if !conflicts.is_empty() {
            for conflict in &conflicts {
                warn!("Conflicting operations: {:?}", conflict);
            }
            return Err(Error::PlanConflicts(conflicts.len()));
        }
    }
    Ok(apply_renames(ops, |op| renamer.rename(op), reporter))
}

/// Set every index in `unmatched` to "do not download" in one call.
/// Returns how many files were skipped; an empty list makes no call.
pub fn skip_unmatched<C: ControlPlane + ?Sized>(
    client: &C,
    torrent_id: &str,
    unmatched: &[usize],
) -> Result<usize, Error> {
    if unmatched.is_empty() {
        return Ok(0);
    }
    client.set_file_priority(torrent_id, &join_file_ids(unmatched), FilePriority::Skip)?;
    info!("Set priority to skip for {} files", unmatched.len());
    Ok(unmatched.len())
}

/// Ask the client to re-verify the torrent. Returns as soon as the request is accepted.
pub fn trigger_recheck<C: ControlPlane + ?Sized>(client: &C, torrent_id: &str) -> Result<(), Error> {
    client.recheck_torrent(torrent_id)?;
    info!("Recheck requested for {}", torrent_id);
    Ok(())
}
