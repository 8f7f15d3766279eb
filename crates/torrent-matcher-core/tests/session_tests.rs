use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use torrent_matcher_core::apply::ApplyOptions;
use torrent_matcher_core::{
    ClientRenamer, ControlPlane, Error, FilePriority, FilesystemRenamer, ManifestEntry,
    MatchSession, MatchStatus, ResolvePolicy, SessionOptions, SilentReporter, TorrentInfo,
};

const HASH: &str = "0123456789abcdef";

/// In-memory torrent client. Renames update the manifest the way a real
/// client re-paths its entries.
struct FakeClient {
    files: RefCell<Vec<ManifestEntry>>,
    calls: RefCell<Vec<String>>,
    reject_renames_of: HashSet<String>,
    unreachable: Cell<bool>,
}

impl FakeClient {
    fn new(files: &[(&str, u64)]) -> Self {
        let files = files
            .iter()
            .enumerate()
            .map(|(index, (name, size))| ManifestEntry {
                index,
                name: name.to_string(),
                size: *size,
                progress: 0.0,
            })
            .collect();
        Self {
            files: RefCell::new(files),
            calls: RefCell::new(Vec::new()),
            reject_renames_of: HashSet::new(),
            unreachable: Cell::new(false),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ControlPlane for FakeClient {
    fn app_version(&self) -> Result<String, Error> {
        Ok("v4.6.0".to_string())
    }

    fn torrents(&self) -> Result<Vec<TorrentInfo>, Error> {
        Ok(Vec::new())
    }

    fn torrent_files(&self, torrent_id: &str) -> Result<Vec<ManifestEntry>, Error> {
        self.calls.borrow_mut().push(format!("files {}", torrent_id));
        if self.unreachable.get() {
            return Err(Error::Other("timed out".to_string()));
        }
        Ok(self.files.borrow().clone())
    }

    fn rename_file(&self, torrent_id: &str, old_path: &str, new_path: &str) -> Result<(), Error> {
        self.calls
            .borrow_mut()
            .push(format!("rename {} {} -> {}", torrent_id, old_path, new_path));
        if self.reject_renames_of.contains(old_path) {
            return Err(Error::Rejected {
                action: "renameFile",
                status: 409,
                body: "Target path already exists".to_string(),
            });
        }
        for entry in self.files.borrow_mut().iter_mut() {
            if entry.name == old_path {
                entry.name = new_path.to_string();
            }
        }
        Ok(())
    }

    fn set_file_priority(
        &self,
        torrent_id: &str,
        file_ids: &str,
        priority: FilePriority,
    ) -> Result<(), Error> {
        self.calls.borrow_mut().push(format!(
            "priority {} {} {}",
            torrent_id,
            file_ids,
            priority.level()
        ));
        Ok(())
    }

    fn recheck_torrent(&self, torrent_id: &str) -> Result<(), Error> {
        self.calls.borrow_mut().push(format!("recheck {}", torrent_id));
        Ok(())
    }
}

/// Layout:
///   root/
///     S01E01.mkv   (10 bytes)  <- torrent's Show/ep01.mkv
///     clip.avi     (20 bytes)  <- same size as Show/ep02.mkv, wrong extension
fn create_tree(root: &Path) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join("S01E01.mkv"), vec![1u8; 10]).unwrap();
    fs::write(root.join("clip.avi"), vec![2u8; 20]).unwrap();
}

fn open<'c>(client: &'c FakeClient, root: &Path) -> MatchSession<'c, FakeClient> {
    MatchSession::open(
        client,
        HASH,
        root.to_str().unwrap(),
        SessionOptions::default(),
        &SilentReporter,
    )
    .unwrap()
}

#[test]
fn test_open_matches_and_reports() {
    let tmp = tempdir().unwrap();
    create_tree(tmp.path());
    let client = FakeClient::new(&[("Show/ep01.mkv", 10), ("Show/ep02.mkv", 20), ("extra.nfo", 5)]);

    let session = open(&client, tmp.path());
    let outcome = session.outcome();
    assert_eq!(outcome.total_files, 3);
    assert_eq!(outcome.matched_count, 1);
    assert_eq!(outcome.results[0].status(), MatchStatus::Selected);
    assert_eq!(outcome.results[1].status(), MatchStatus::Unmatched);
    assert_eq!(session.scan().files.len(), 2);
}

#[test]
fn test_invalid_path_fails_before_contacting_client() {
    let tmp = tempdir().unwrap();
    let client = FakeClient::new(&[("a.bin", 1)]);

    let empty = MatchSession::open(&client, HASH, "", SessionOptions::default(), &SilentReporter);
    assert!(matches!(empty, Err(Error::EmptyPath)));

    let missing = tmp.path().join("missing");
    let result = MatchSession::open(
        &client,
        HASH,
        missing.to_str().unwrap(),
        SessionOptions::default(),
        &SilentReporter,
    );
    assert!(matches!(result, Err(Error::DirectoryNotFound(_))));
    assert!(client.calls().is_empty());
}

#[test]
fn test_apply_moves_files_and_reloads() {
    let tmp = tempdir().unwrap();
    create_tree(tmp.path());
    let client = FakeClient::new(&[("Show/ep01.mkv", 10), ("Show/ep02.mkv", 20)]);

    let mut session = open(&client, tmp.path());
    let plan = session.plan().unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(
        plan.ops[0].new_path,
        session.scan_root().join("Show").join("ep01.mkv")
    );

    let report = session
        .apply(&plan, &FilesystemRenamer, &SilentReporter)
        .unwrap();
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failure_count, 0);
    assert!(tmp.path().join("Show").join("ep01.mkv").exists());
    assert!(!tmp.path().join("S01E01.mkv").exists());

    // Reloaded state already has the file in place, so nothing is left to do
    assert!(session.plan().unwrap().is_empty());
    assert_eq!(
        client.calls().iter().filter(|c| c.starts_with("files")).count(),
        2
    );
}

#[test]
fn test_stale_plan_is_rejected() {
    let tmp = tempdir().unwrap();
    create_tree(tmp.path());
    let client = FakeClient::new(&[("Show/ep01.mkv", 10)]);

    let mut session = open(&client, tmp.path());
    let plan = session.plan().unwrap();
    session.apply(&plan, &FilesystemRenamer, &SilentReporter).unwrap();

    let again = session.apply(&plan, &FilesystemRenamer, &SilentReporter);
    assert!(matches!(again, Err(Error::StalePlan { plan: 0, .. })));
}

#[test]
fn test_refresh_discards_edits() {
    let tmp = tempdir().unwrap();
    create_tree(tmp.path());
    let client = FakeClient::new(&[("Show/ep01.mkv", 10)]);

    let mut session = open(&client, tmp.path());
    session.clear(0);
    assert_eq!(session.selections().dirty_indices(), vec![0]);
    let before = session.plan().unwrap();
    assert!(before.is_empty());

    session.refresh(&SilentReporter).unwrap();
    assert!(session.selections().dirty_indices().is_empty());
    assert_eq!(session.generation(), 1);
    assert!(matches!(
        session.apply(&before, &FilesystemRenamer, &SilentReporter),
        Err(Error::StalePlan { .. })
    ));
}

#[test]
fn test_ambiguous_entries_resolved_by_policy() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("a.mkv"), vec![0u8; 100]).unwrap();
    fs::write(tmp.path().join("b.mkv"), vec![0u8; 100]).unwrap();
    let client = FakeClient::new(&[("a.mkv", 100), ("b.mkv", 100)]);

    let mut session = open(&client, tmp.path());
    assert_eq!(session.outcome().ambiguous_count(), 2);
    assert!(session.plan().unwrap().is_empty());

    session.resolve(ResolvePolicy::ExactName);
    assert_eq!(session.selections().selected_count(), 2);
    // Every file is already where its entry expects it
    assert!(session.plan().unwrap().is_empty());
    // The scan report still counts auto-matches only
    assert_eq!(session.outcome().matched_count, 0);
}

#[test]
fn test_conflicting_selections_surface_at_apply_time() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("shared.mkv"), vec![0u8; 100]).unwrap();
    fs::write(tmp.path().join("other.mkv"), vec![0u8; 100]).unwrap();
    let client = FakeClient::new(&[("one.mkv", 100), ("two.mkv", 100)]);

    let mut session = open(&client, tmp.path());
    let shared = session.scan().files.iter().find(|f| f.name == "shared.mkv").unwrap().clone();
    session.select(0, shared.clone());
    session.select(1, shared);
    assert_eq!(session.selections().duplicate_selections().len(), 1);

    let plan = session.plan().unwrap();
    let report = session
        .apply(&plan, &FilesystemRenamer, &SilentReporter)
        .unwrap();
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failure_count, 1);
    assert_eq!(report.failures[0].op.manifest_index, 1);
}

#[test]
fn test_strict_mode_refuses_conflicting_plan() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("shared.mkv"), vec![0u8; 100]).unwrap();
    let client = FakeClient::new(&[("one.mkv", 100), ("two.mkv", 100)]);

    let options = SessionOptions {
        apply: ApplyOptions {
            reject_conflicts: true,
        },
        ..SessionOptions::default()
    };
    let mut session = MatchSession::open(
        &client,
        HASH,
        tmp.path().to_str().unwrap(),
        options,
        &SilentReporter,
    )
    .unwrap();
    // The single file auto-matches both entries
    assert_eq!(session.outcome().matched_count, 2);

    let plan = session.plan().unwrap();
    let result = session.apply(&plan, &FilesystemRenamer, &SilentReporter);
    assert!(matches!(result, Err(Error::PlanConflicts(1))));
    assert!(tmp.path().join("shared.mkv").exists());
    // Nothing changed, so the plan is still current
    assert_eq!(session.generation(), 0);
}

#[test]
fn test_client_renamer_points_entries_at_disk_files() {
    let tmp = tempdir().unwrap();
    create_tree(tmp.path());
    let mut client = FakeClient::new(&[("Show/ep01.mkv", 10), ("clip.mkv", 20)]);
    client.reject_renames_of.insert("clip.mkv".to_string());

    let mut session = MatchSession::open(
        &client,
        HASH,
        tmp.path().to_str().unwrap(),
        SessionOptions {
            require_same_extension: false,
            ..SessionOptions::default()
        },
        &SilentReporter,
    )
    .unwrap();
    let plan = session.plan().unwrap();
    assert_eq!(plan.len(), 2);

    let renamer = ClientRenamer::new(&client, HASH);
    let report = session.apply(&plan, &renamer, &SilentReporter).unwrap();
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failure_count, 1);
    assert!(report.failures[0].error.contains("409"));

    let calls = client.calls();
    assert!(calls.contains(&format!("rename {} Show/ep01.mkv -> S01E01.mkv", HASH)));
    // Disk is untouched; the torrent now expects the file where it already is
    assert!(tmp.path().join("S01E01.mkv").exists());
    assert_eq!(session.manifest()[0].name, "S01E01.mkv");
}

#[test]
fn test_skip_unmatched_and_recheck() {
    let tmp = tempdir().unwrap();
    create_tree(tmp.path());
    let client = FakeClient::new(&[("Show/ep01.mkv", 10), ("Show/ep02.mkv", 20), ("extra.nfo", 5)]);

    let mut session = open(&client, tmp.path());
    let skipped = session.skip_unmatched(&SilentReporter).unwrap();
    assert_eq!(skipped, 2);
    session.trigger_recheck().unwrap();

    let calls = client.calls();
    assert!(calls.contains(&format!("priority {} 1,2 0", HASH)));
    assert_eq!(calls.last().unwrap(), &format!("recheck {}", HASH));
    assert_eq!(session.generation(), 2);
}

#[test]
fn test_skip_unmatched_with_nothing_to_skip() {
    let tmp = tempdir().unwrap();
    create_tree(tmp.path());
    let client = FakeClient::new(&[("Show/ep01.mkv", 10)]);

    let mut session = open(&client, tmp.path());
    assert_eq!(session.skip_unmatched(&SilentReporter).unwrap(), 0);
    assert!(!client.calls().iter().any(|c| c.starts_with("priority")));
    assert_eq!(session.generation(), 0);
}

#[test]
fn test_report_survives_failed_reload() {
    let tmp = tempdir().unwrap();
    create_tree(tmp.path());
    let client = FakeClient::new(&[("Show/ep01.mkv", 10)]);

    let mut session = open(&client, tmp.path());
    let plan = session.plan().unwrap();
    client.unreachable.set(true);

    let report = session
        .apply(&plan, &FilesystemRenamer, &SilentReporter)
        .unwrap();
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failure_count, 0);
    assert!(tmp.path().join("Show").join("ep01.mkv").exists());

    // Until a reload succeeds nothing new can be planned or applied
    assert!(session.is_stale());
    assert!(matches!(session.plan(), Err(Error::NeedsRefresh)));
    assert!(matches!(
        session.apply(&plan, &FilesystemRenamer, &SilentReporter),
        Err(Error::NeedsRefresh)
    ));
    assert!(session.refresh(&SilentReporter).is_err());

    client.unreachable.set(false);
    session.refresh(&SilentReporter).unwrap();
    assert!(!session.is_stale());
    assert!(session.plan().unwrap().is_empty());
}

#[test]
fn test_unmatched_entries_follow_manifest_order() {
    let tmp = tempdir().unwrap();
    create_tree(tmp.path());
    let client = FakeClient::new(&[("extra.nfo", 5), ("Show/ep01.mkv", 10), ("Show/ep02.mkv", 20)]);

    let session = open(&client, tmp.path());
    let names: Vec<&str> = session
        .unmatched_entries()
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, vec!["extra.nfo", "Show/ep02.mkv"]);
    assert!(!client.calls().iter().any(|c| c.starts_with("priority")));
}
