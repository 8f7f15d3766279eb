use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use torrent_matcher_core::{ProgressReporter, RenameOp};

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: spinner (file count unknown upfront)
/// - Apply phase: progress bar over the rename plan
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, root: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars(TICK_CHARS),
        );
        pb.set_message(format!("Scanning {}...", root));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_scan_progress(&self, files_found: usize, _current_path: &str) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!("Scanning... {} files found", files_found));
        }
    }

    fn on_scan_complete(&self, total_files: usize, skipped: usize, duration_secs: f64) {
        self.finish_bar();
        if skipped > 0 {
            eprintln!(
                "  \x1b[32m✓\x1b[0m Scan complete: {} files in {:.2}s ({} inaccessible skipped)",
                total_files, duration_secs, skipped
            );
        } else {
            eprintln!(
                "  \x1b[32m✓\x1b[0m Scan complete: {} files in {:.2}s",
                total_files, duration_secs
            );
        }
    }

    fn on_match_complete(&self, matched: usize, total: usize) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Matched {}/{} torrent files",
            matched, total
        );
    }

    fn on_apply_start(&self, total_ops: usize) {
        let pb = ProgressBar::new(total_ops as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Renaming [{bar:30.cyan/dim}] {pos}/{len} {msg}",
            )
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_apply_progress(&self, done: usize, _total_ops: usize, op: &RenameOp) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_position(done as u64);
            pb.set_message(op.manifest_name.clone());
        }
    }

    fn on_apply_complete(&self, succeeded: usize, failed: usize, duration_secs: f64) {
        self.finish_bar();
        let mark = if failed == 0 {
            "\x1b[32m✓\x1b[0m"
        } else {
            "\x1b[33m!\x1b[0m"
        };
        eprintln!(
            "  {} Renames complete: {} succeeded, {} failed in {:.2}s",
            mark, succeeded, failed, duration_secs
        );
    }
}
