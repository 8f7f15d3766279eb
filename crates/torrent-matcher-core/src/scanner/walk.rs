use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::error::Error;
use crate::model::DiskFile;
use crate::progress::ProgressReporter;

const PROGRESS_EVERY: usize = 256;

/// Flat result of a recursive directory walk.
#[derive(Debug, Clone)]
pub struct DirectoryScan {
    /// Canonical form of the requested root. Every `files[i].path` is under it.
    pub root: PathBuf,
    /// Regular files in walk order (directory entries sorted by name).
    pub files: Vec<DiskFile>,
    /// Entries that could not be read and were left out.
    pub skipped: usize,
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };
    match directories::UserDirs::new() {
        Some(dirs) => dirs
            .home_dir()
            .join(rest.trim_start_matches(|c| c == '/' || c == '\\')),
        None => PathBuf::from(path),
    }
}

pub fn directory_exists(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// The root as `scan_directory` reports it: `~` expanded, then canonical.
/// Paths that cannot be canonicalized are returned expanded but otherwise as given.
pub fn resolve_root(path: &Path) -> PathBuf {
    let expanded = expand_home(&path.to_string_lossy());
    fs::canonicalize(&expanded).unwrap_or(expanded)
}

/// Sequential recursive walk of `root`. Symlinks are not followed, so link
/// cycles cannot recurse. Unreadable entries are logged, counted, and skipped.
pub fn scan_directory(
    root: &str,
    ignore_globs: &[String],
    reporter: &dyn ProgressReporter,
) -> Result<DirectoryScan, Error> {
    let trimmed = root.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyPath);
    }

    let requested = expand_home(trimmed);
    if !directory_exists(&requested) {
        return Err(Error::DirectoryNotFound(requested));
    }
    let root = fs::canonicalize(&requested)?;

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    reporter.on_scan_start(&root.to_string_lossy());
    let start = Instant::now();

    let mut files = Vec::new();
    let mut skipped = 0usize;

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !ignore_patterns
                    .iter()
                    .any(|pattern| pattern.matches_path(entry.path()))
        });

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let at = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                warn!("Skipping inaccessible path {}: {}", at, err);
                skipped += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(
                    "Error getting metadata for {}: {}",
                    entry.path().display(),
                    err
                );
                skipped += 1;
                continue;
            }
        };

        files.push(DiskFile {
            path: entry.path().to_path_buf(),
            name: entry.file_name().to_string_lossy().into_owned(),
            size: metadata.len(),
        });

        if files.len() % PROGRESS_EVERY == 0 {
            reporter.on_scan_progress(files.len(), &entry.path().to_string_lossy());
        }
    }

    let duration = start.elapsed();
    if skipped > 0 {
        warn!(
            "Skipped {} inaccessible files/directories during scan",
            skipped
        );
    }
    debug!(
        "Scanned {} in {:.2}s, {} files",
        root.display(),
        duration.as_secs_f64(),
        files.len()
    );
    reporter.on_scan_complete(files.len(), skipped, duration.as_secs_f64());

    Ok(DirectoryScan {
        root,
        files,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use tempfile::tempdir;

    #[test]
    fn test_empty_path_is_rejected() {
        let err = scan_directory("   ", &[], &SilentReporter).unwrap_err();
        assert!(matches!(err, Error::EmptyPath));
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let err = scan_directory(missing.to_str().unwrap(), &[], &SilentReporter).unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound(_)));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("a.bin");
        fs::write(&file, b"abc").unwrap();
        assert!(!directory_exists(&file));
        assert!(directory_exists(tmp.path()));
    }

    #[test]
    fn test_scan_is_recursive_and_sorted() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("b_dir")).unwrap();
        fs::write(tmp.path().join("c.mkv"), vec![0u8; 30]).unwrap();
        fs::write(tmp.path().join("a.mkv"), vec![0u8; 10]).unwrap();
        fs::write(tmp.path().join("b_dir").join("inner.mkv"), vec![0u8; 20]).unwrap();

        let scan = scan_directory(tmp.path().to_str().unwrap(), &[], &SilentReporter).unwrap();
        let names: Vec<&str> = scan.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.mkv", "inner.mkv", "c.mkv"]);
        assert_eq!(scan.files[1].size, 20);
        assert_eq!(scan.skipped, 0);
        assert!(scan.files.iter().all(|f| f.path.starts_with(&scan.root)));
    }

    #[test]
    fn test_ignore_patterns_skip_directories() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("incomplete")).unwrap();
        fs::write(tmp.path().join("keep.mkv"), b"x").unwrap();
        fs::write(tmp.path().join("incomplete").join("drop.mkv"), b"x").unwrap();
        fs::write(tmp.path().join("drop.part"), b"x").unwrap();

        let ignore = vec!["**/incomplete".to_string(), "**/*.part".to_string()];
        let scan = scan_directory(tmp.path().to_str().unwrap(), &ignore, &SilentReporter).unwrap();
        let names: Vec<&str> = scan.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["keep.mkv"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let tmp = tempdir().unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("file.bin"), b"data").unwrap();
        std::os::unix::fs::symlink(tmp.path(), sub.join("loop")).unwrap();

        let scan = scan_directory(tmp.path().to_str().unwrap(), &[], &SilentReporter).unwrap();
        assert_eq!(scan.files.len(), 1);
        assert_eq!(scan.files[0].name, "file.bin");
    }

    #[test]
    fn test_resolve_root_matches_scan_root() {
        let tmp = tempdir().unwrap();
        let scan = scan_directory(tmp.path().to_str().unwrap(), &[], &SilentReporter).unwrap();
        assert_eq!(resolve_root(tmp.path()), scan.root);

        let missing = PathBuf::from("/no/such/dir/anywhere");
        assert_eq!(resolve_root(&missing), missing);
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/data/x"), PathBuf::from("/data/x"));
        assert_eq!(expand_home("relative"), PathBuf::from("relative"));
    }
}
