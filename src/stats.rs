//! Read-only reports: file counts per extension, and capture-year checks.

use crate::listing::walk_tree;
use crate::relocate::{RelocateResult, validate_existing_dir};
use crate::timestamp::TimestampProvider;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key used for files without an extension.
pub const NO_EXTENSION: &str = "(none)";

/// File counts of a tree.
#[derive(Debug, Clone, Default)]
pub struct FolderStats {
    /// Lowercased extension to file count.
    pub by_extension: BTreeMap<String, usize>,
    pub total_files: usize,
    /// Entries skipped because they could not be read.
    pub unreadable: Vec<(PathBuf, String)>,
}

/// Counts the regular files under `root` by extension.
pub fn folder_stats(root: &Path) -> RelocateResult<FolderStats> {
    validate_existing_dir(root)?;

    let walk = walk_tree(root)?;
    let mut stats = FolderStats {
        unreadable: walk.unreadable,
        ..Default::default()
    };
    for path in walk.files {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| NO_EXTENSION.to_string());
        *stats.by_extension.entry(ext).or_insert(0) += 1;
        stats.total_files += 1;
    }
    Ok(stats)
}

/// How a file's capture year compares to the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearVerdict {
    Correct,
    Wrong,
    Unknown,
}

/// Verdict for a single file.
#[derive(Debug, Clone)]
pub struct YearCheck {
    pub path: PathBuf,
    pub timestamp: Option<String>,
    pub verdict: YearVerdict,
}

/// Result of a year verification.
#[derive(Debug, Clone, Default)]
pub struct YearReport {
    pub expected_year: i32,
    pub checks: Vec<YearCheck>,
    pub unreadable: Vec<(PathBuf, String)>,
}

impl YearReport {
    pub fn count(&self, verdict: YearVerdict) -> usize {
        self.checks.iter().filter(|c| c.verdict == verdict).count()
    }
}

/// Compares the capture year of every datable file under `root` with `expected_year`.
///
/// Files the provider does not handle are skipped. The year is the first four
/// characters of the timestamp.
pub fn verify_year(
    root: &Path,
    expected_year: i32,
    provider: &dyn TimestampProvider,
) -> RelocateResult<YearReport> {
    validate_existing_dir(root)?;

    let walk = walk_tree(root)?;
    let expected = expected_year.to_string();
    let mut report = YearReport {
        expected_year,
        checks: Vec::new(),
        unreadable: walk.unreadable,
    };

    for path in walk.files {
        if !provider.handles(&path) {
            continue;
        }
        let timestamp = provider.capture_timestamp(&path);
        let verdict = match &timestamp {
            None => YearVerdict::Unknown,
            Some(ts) if ts.chars().take(4).eq(expected.chars()) => YearVerdict::Correct,
            Some(_) => YearVerdict::Wrong,
        };
        report.checks.push(YearCheck {
            path,
            timestamp,
            verdict,
        });
    }
    Ok(report)
}
