//! Detection of base names that occur more than once in a tree.

use crate::listing::walk_files;
use crate::relocate::RelocateResult;
use std::collections::BTreeMap;
use std::path::Path;

/// Counts every regular file name under `root` and keeps those seen more than once.
///
/// Read-only. Used as the safety gate before a plain restore, where two files of
/// the same name would end up at the same destination.
pub fn find_duplicate_names(root: &Path) -> RelocateResult<BTreeMap<String, usize>> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for path in walk_files(root)? {
        if let Some(name) = path.file_name() {
            *counts.entry(name.to_string_lossy().into_owned()).or_insert(0) += 1;
        }
    }
    counts.retain(|_, count| *count > 1);
    Ok(counts)
}
