use crate::plan::RenameOp;

/// Trait for reporting workflow progress.
///
/// CLI implements with indicatif. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _root: &str) {}
    fn on_scan_progress(&self, _files_found: usize, _current_path: &str) {}
    fn on_scan_complete(&self, _total_files: usize, _skipped: usize, _duration_secs: f64) {}
    fn on_match_complete(&self, _matched: usize, _total: usize) {}
    fn on_apply_start(&self, _total_ops: usize) {}
    fn on_apply_progress(&self, _done: usize, _total_ops: usize, _op: &RenameOp) {}
    fn on_apply_complete(&self, _succeeded: usize, _failed: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
