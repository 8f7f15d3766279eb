use ahash::AHashMap;

use crate::model::DiskFile;

/// On-disk files grouped by exact byte size. Each group keeps scan order.
#[derive(Debug, Default, Clone)]
pub struct DiskIndex {
    by_size: AHashMap<u64, Vec<DiskFile>>,
    total_files: usize,
}

impl DiskIndex {
    pub fn build(files: &[DiskFile]) -> Self {
        let mut by_size: AHashMap<u64, Vec<DiskFile>> = AHashMap::with_capacity(files.len());
        for file in files {
            by_size.entry(file.size).or_default().push(file.clone());
        }
        Self {
            by_size,
            total_files: files.len(),
        }
    }

    /// Files of exactly `size` bytes, in scan order. Empty when none.
    pub fn lookup(&self, size: u64) -> &[DiskFile] {
        self.by_size.get(&size).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn distinct_sizes(&self) -> usize {
        self.by_size.len()
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }
}

impl FromIterator<DiskFile> for DiskIndex {
    fn from_iter<I: IntoIterator<Item = DiskFile>>(iter: I) -> Self {
        let files: Vec<DiskFile> = iter.into_iter().collect();
        Self::build(&files)
    }
}
