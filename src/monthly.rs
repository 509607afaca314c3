/// Monthly bucketing: one folder per capture month.
///
/// Every file under the source tree is dated through a [`TimestampProvider`]
/// and moved into `YYYY_MM` (or `Unknown`) directly under the source folder,
/// whichever subdirectory it came from. Directories emptied by the pass are
/// removed afterwards, leaving a single level of month folders.
use crate::config::CompiledFilters;
use crate::listing::walk_tree;
use crate::relocate::{MoveAction, RelocateError, RelocateResult, path_taken, validate_source_dir};
use crate::timestamp::TimestampProvider;
use indicatif::ProgressBar;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Folder for files without a usable capture timestamp.
pub const UNKNOWN_MONTH: &str = "Unknown";

/// Derives the month folder name from a capture timestamp.
///
/// The timestamp is sliced by position, never parsed: characters 0-3 are the
/// year and 5-6 the month.
///
/// # Examples
///
/// ```
/// use picsort::monthly::month_key;
///
/// assert_eq!(month_key(Some("2021-07-15T10:00:00")), "2021_07");
/// assert_eq!(month_key(Some("2021")), "Unknown");
/// assert_eq!(month_key(None), "Unknown");
/// ```
pub fn month_key(timestamp: Option<&str>) -> String {
    let Some(timestamp) = timestamp else {
        return UNKNOWN_MONTH.to_string();
    };
    let chars: Vec<char> = timestamp.chars().take(7).collect();
    if chars.len() < 7 {
        return UNKNOWN_MONTH.to_string();
    }
    let year: String = chars[0..4].iter().collect();
    let month: String = chars[5..7].iter().collect();
    format!("{}_{}", year, month)
}

/// What happened inside one month folder.
#[derive(Debug, Clone, Default)]
pub struct MonthOutcome {
    pub created_folder: bool,
    pub moves: Vec<MoveAction>,
    /// Files that were already in this folder.
    pub already_in_place: usize,
}

/// Result of a monthly bucketing pass.
#[derive(Debug, Clone, Default)]
pub struct MonthlyReport {
    pub dry_run: bool,
    pub months: BTreeMap<String, MonthOutcome>,
    /// Moves refused because the destination name was taken.
    pub conflicts: Vec<MoveAction>,
    pub failures: Vec<(PathBuf, String)>,
    /// Directories removed after being emptied.
    pub removed_dirs: Vec<PathBuf>,
}

impl MonthlyReport {
    pub fn total_moved(&self) -> usize {
        self.months.values().map(|m| m.moves.len()).sum()
    }

    /// Files per month key, whether moved or already in place.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.months
            .iter()
            .map(|(key, m)| (key.clone(), m.moves.len() + m.already_in_place))
            .collect()
    }
}

/// Moves every file under `base_path` into its capture-month folder.
///
/// The provider is asked once per file. A progress bar, if given, is advanced
/// for each file dated.
pub fn bucket_by_month(
    base_path: &Path,
    provider: &dyn TimestampProvider,
    filters: &CompiledFilters,
    dry_run: bool,
    progress: Option<&ProgressBar>,
) -> RelocateResult<MonthlyReport> {
    validate_source_dir(base_path)?;

    let walk = walk_tree(base_path)?;
    let files: Vec<PathBuf> = walk
        .files
        .into_iter()
        .filter(|path| filters.should_include(path))
        .collect();

    if let Some(pb) = progress {
        pb.set_length(files.len() as u64);
    }

    let mut by_key: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in files {
        let key = month_key(provider.capture_timestamp(&path).as_deref());
        by_key.entry(key).or_default().push(path);
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    let mut report = MonthlyReport {
        dry_run,
        failures: walk.unreadable,
        ..Default::default()
    };
    let mut vacated: BTreeSet<PathBuf> = BTreeSet::new();

    for (key, paths) in by_key {
        let folder = base_path.join(&key);
        let mut outcome = MonthOutcome::default();

        if !folder.is_dir() {
            outcome.created_folder = true;
            if !dry_run && let Err(e) = fs::create_dir(&folder) {
                let error = RelocateError::DirectoryCreationFailed {
                    path: folder.clone(),
                    source: e,
                };
                report
                    .failures
                    .extend(paths.into_iter().map(|p| (p, error.to_string())));
                continue;
            }
        }

        for path in paths {
            if path.parent() == Some(folder.as_path()) {
                outcome.already_in_place += 1;
                continue;
            }
            let Some(name) = path.file_name() else {
                continue;
            };

            let action = MoveAction::new(&path, folder.join(name));
            if path_taken(&action.destination) {
                report.conflicts.push(action);
                continue;
            }
            if dry_run {
                outcome.moves.push(action);
                continue;
            }
            match action.execute() {
                Ok(()) => {
                    if let Some(parent) = path.parent() {
                        vacated.insert(parent.to_path_buf());
                    }
                    outcome.moves.push(action);
                }
                Err(e) => report.failures.push((path, e.to_string())),
            }
        }

        report.months.insert(key, outcome);
    }

    if !dry_run {
        let keep: BTreeSet<PathBuf> = report.months.keys().map(|k| base_path.join(k)).collect();
        report.removed_dirs = prune_vacated(base_path, vacated, &keep);
    }

    Ok(report)
}

/// Removes vacated directories, and then their parents, while they are empty.
///
/// Deepest directories go first. `base_path` and the `keep` folders are never
/// removed, and a non-empty directory stops the climb.
fn prune_vacated(base_path: &Path, vacated: BTreeSet<PathBuf>, keep: &BTreeSet<PathBuf>) -> Vec<PathBuf> {
    let mut ordered: Vec<PathBuf> = vacated.into_iter().collect();
    ordered.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

    let mut removed = Vec::new();
    for dir in ordered {
        let mut cursor = dir.as_path();
        while cursor != base_path && cursor.starts_with(base_path) && !keep.contains(cursor) {
            if fs::remove_dir(cursor).is_err() {
                break;
            }
            removed.push(cursor.to_path_buf());
            match cursor.parent() {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
    }
    removed
}
