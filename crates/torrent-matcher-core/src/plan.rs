use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::matcher::MatchResult;

/// One filesystem move: the selected disk file to where the torrent expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameOp {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub manifest_index: usize,
    pub manifest_name: String,
    /// `old_path` relative to the scan root, `/`-separated. `None` when the
    /// file lies outside the root.
    pub relative_source: Option<String>,
}

/// Operations stamped with the session generation they were built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub ops: Vec<RenameOp>,
    pub generation: u64,
}

impl RenamePlan {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanConflict {
    /// Several operations would move the same disk file.
    SharedSource { path: PathBuf, ops: Vec<usize> },
    /// Several operations would write the same destination.
    SharedTarget { path: PathBuf, ops: Vec<usize> },
}

/// Build the renames for every selected result, with the torrent content
/// rooted at the scan root.
pub fn plan_renames(results: &[MatchResult], scan_root: &Path) -> Vec<RenameOp> {
    plan_renames_into(results, scan_root, scan_root)
}

/// Build the renames for every selected result. A result whose file already
/// sits at the manifest name (relative to `scan_root`, compared
/// case-sensitively) produces no operation. Output order follows `results`.
pub fn plan_renames_into(
    results: &[MatchResult],
    scan_root: &Path,
    content_root: &Path,
) -> Vec<RenameOp> {
    let mut ops = Vec::new();

    for result in results {
        let Some(selected) = &result.selected else {
            continue;
        };
        let entry = &result.manifest_entry;
        let relative_source = relative_to_root(&selected.path, scan_root);

        if relative_source.as_deref() == Some(entry.name.as_str()) {
            debug!("{} already in place", entry.name);
            continue;
        }

        let Some(new_path) = join_manifest_name(content_root, &entry.name) else {
            warn!("Skipping {}: name leaves the content root", entry.name);
            continue;
        };

        ops.push(RenameOp {
            old_path: selected.path.clone(),
            new_path,
            manifest_index: entry.index,
            manifest_name: entry.name.clone(),
            relative_source,
        });
    }

    ops
}

/// `path` relative to `root` as a `/`-separated string. The root prefix is
/// matched ignoring case, after both sides have `\` turned into `/`.
pub fn relative_to_root(path: &Path, root: &Path) -> Option<String> {
    let path = normalize_separators(&path.to_string_lossy());
    let root = normalize_separators(&root.to_string_lossy());
    let root = root.trim_end_matches('/');

    let n = root.len();
    if path.len() <= n || !path.is_char_boundary(n) {
        return None;
    }
    let (head, tail) = path.split_at(n);
    if head.to_lowercase() != root.to_lowercase() {
        return None;
    }

    let rest = tail.strip_prefix('/')?;
    (!rest.is_empty()).then(|| rest.to_string())
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// `name` joined under `content_root`. Empty and `.` segments are dropped;
/// `None` if any segment is `..` or carries a root or drive prefix.
fn join_manifest_name(content_root: &Path, name: &str) -> Option<PathBuf> {
    let mut joined = content_root.to_path_buf();
    let mut pushed = false;
    for part in name.split(|c: char| c == '/' || c == '\\') {
        if part.is_empty() || part == "." {
            continue;
        }
        let plain = Path::new(part)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return None;
        }
        joined.push(part);
        pushed = true;
    }
    pushed.then_some(joined)
}

/// Operations sharing a source or a destination. Sources are reported first.
pub fn find_conflicts(ops: &[RenameOp]) -> Vec<PlanConflict> {
    let sources = shared_paths(ops, |op| &op.old_path)
        .into_iter()
        .map(|(path, ops)| PlanConflict::SharedSource { path, ops });
    let targets = shared_paths(ops, |op| &op.new_path)
        .into_iter()
        .map(|(path, ops)| PlanConflict::SharedTarget { path, ops });
    sources.chain(targets).collect()
}

fn shared_paths<'a>(
    ops: &'a [RenameOp],
    key: impl Fn(&'a RenameOp) -> &'a PathBuf,
) -> Vec<(PathBuf, Vec<usize>)> {
    let mut seen: AHashMap<&PathBuf, Vec<usize>> = AHashMap::new();
    let mut order = Vec::new();
    for (i, op) in ops.iter().enumerate() {
        let path = key(op);
        let positions = seen.entry(path).or_default();
        if positions.is_empty() {
            order.push(path);
        }
        positions.push(i);
    }
    order
        .into_iter()
        .filter_map(|path| {
            let positions = seen.remove(path)?;
            (positions.len() > 1).then(|| (path.clone(), positions))
        })
        .collect()
}
