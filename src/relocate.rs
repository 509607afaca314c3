/// Moving files between a photo folder and its bucket subfolders.
///
/// This module owns the error type shared by every relocation pass, the
/// no-overwrite move primitive, the source-folder guard, and the forward
/// relocation that sorts a flat folder into its bucket subfolders.
use crate::bucket::{Bucket, Criterion};
use crate::config::CompiledFilters;
use crate::listing::DirListing;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during relocation operations.
#[derive(Debug)]
pub enum RelocateError {
    /// The source path is missing or not a directory.
    InvalidSourcePath { path: PathBuf, reason: String },
    /// The source directory itself carries a reserved bucket name.
    ReservedFolderName { path: PathBuf, name: String },
    /// Failed to list a directory.
    DirectoryReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a destination directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a file.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// A file already occupies the destination.
    DestinationExists {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Every `__NNN` ordinal is already taken in the destination directory.
    NoFreeSuffix { source: PathBuf, dir: PathBuf },
    /// Base names occurring more than once in the tree.
    DuplicateNames { duplicates: BTreeMap<String, usize> },
    /// The operation cannot be simulated.
    DryRunUnsupported { operation: &'static str },
}

impl std::fmt::Display for RelocateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSourcePath { path, reason } => {
                write!(f, "Invalid source path {}: {}", path.display(), reason)
            }
            Self::ReservedFolderName { path, name } => {
                write!(
                    f,
                    "The folder {} has the reserved name '{}' and will not be modified",
                    path.display(),
                    name
                )
            }
            Self::DirectoryReadFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::DestinationExists {
                source,
                destination,
            } => {
                write!(
                    f,
                    "Refusing to move {}: {} already exists",
                    source.display(),
                    destination.display()
                )
            }
            Self::NoFreeSuffix { source, dir } => {
                write!(
                    f,
                    "No free rename suffix for {} in {}",
                    source.display(),
                    dir.display()
                )
            }
            Self::DuplicateNames { duplicates } => {
                write!(
                    f,
                    "{} file name(s) occur more than once: ",
                    duplicates.len()
                )?;
                let listed: Vec<String> = duplicates
                    .iter()
                    .map(|(name, count)| format!("{} ({}x)", name, count))
                    .collect();
                write!(f, "{}", listed.join(", "))
            }
            Self::DryRunUnsupported { operation } => {
                write!(f, "Dry run is not supported for {}", operation)
            }
        }
    }
}

impl std::error::Error for RelocateError {}

/// Result type for relocation operations.
pub type RelocateResult<T> = Result<T, RelocateError>;

/// An intended move of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAction {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl MoveAction {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Performs the move, refusing to replace anything at the destination.
    pub fn execute(&self) -> RelocateResult<()> {
        if path_taken(&self.destination) {
            return Err(RelocateError::DestinationExists {
                source: self.source.clone(),
                destination: self.destination.clone(),
            });
        }

        fs::rename(&self.source, &self.destination).map_err(|e| RelocateError::FileMoveFailure {
            source: self.source.clone(),
            destination: self.destination.clone(),
            source_error: e,
        })
    }
}

/// Returns true if anything, including a dangling symlink, exists at `path`.
pub fn path_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Checks that `path` is an existing directory.
pub fn validate_existing_dir(path: &Path) -> RelocateResult<()> {
    if !path.exists() {
        return Err(RelocateError::InvalidSourcePath {
            path: path.to_path_buf(),
            reason: "path does not exist".to_string(),
        });
    }
    if !path.is_dir() {
        return Err(RelocateError::InvalidSourcePath {
            path: path.to_path_buf(),
            reason: "path is not a directory".to_string(),
        });
    }
    Ok(())
}

/// Checks that `path` may be used as the source of a relocation.
///
/// The directory must exist, and neither the name it was given by nor the name
/// it resolves to may be one of the reserved bucket names, so a bucket folder is
/// never processed as a top-level folder.
pub fn validate_source_dir(path: &Path) -> RelocateResult<()> {
    validate_existing_dir(path)?;

    let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    for candidate in [path, resolved.as_path()] {
        if let Some(name) = candidate.file_name().and_then(|n| n.to_str())
            && Bucket::is_reserved_name(name)
        {
            return Err(RelocateError::ReservedFolderName {
                path: path.to_path_buf(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// What one criterion did to the folder.
#[derive(Debug, Clone)]
pub struct BucketOutcome {
    /// Destination subfolder name.
    pub folder: String,
    /// Moves performed, or planned under dry run.
    pub moves: Vec<MoveAction>,
    /// The subfolder had to be created (or would be, under dry run).
    pub created_folder: bool,
    /// The subfolder was already there before the pass reached it.
    pub folder_existed: bool,
    /// Files that matched but could not be moved.
    pub failures: Vec<(PathBuf, String)>,
}

impl BucketOutcome {
    fn new(folder: &str) -> Self {
        Self {
            folder: folder.to_string(),
            moves: Vec::new(),
            created_folder: false,
            folder_existed: false,
            failures: Vec::new(),
        }
    }

    /// Number of files matched by the criterion.
    pub fn matched(&self) -> usize {
        self.moves.len() + self.failures.len()
    }
}

/// Result of a forward relocation pass.
#[derive(Debug, Clone)]
pub struct ForwardReport {
    pub dry_run: bool,
    /// One outcome per criterion, in evaluation order.
    pub buckets: Vec<BucketOutcome>,
}

impl ForwardReport {
    /// Files moved (or planned) into `folder`.
    pub fn count_for(&self, folder: &str) -> usize {
        self.buckets
            .iter()
            .filter(|b| b.folder == folder)
            .map(|b| b.moves.len())
            .sum()
    }

    /// Total files moved (or planned).
    pub fn total_moved(&self) -> usize {
        self.buckets.iter().map(|b| b.moves.len()).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.buckets.iter().map(|b| b.failures.len()).sum()
    }
}

/// Sorts the files of `base_path` into subfolders, one criterion at a time.
///
/// The directory is listed once. For each criterion in order, the remaining
/// candidates are matched, the subfolder is created if something matched, and
/// the matches are moved into it. A moved file is consumed from the listing and
/// so can match no later criterion. Under dry run nothing is moved and nothing
/// is consumed, so a file matching several criteria is counted in each of them.
///
/// # Examples
///
/// ```no_run
/// use picsort::bucket::default_criteria;
/// use picsort::config::PicsortConfig;
/// use picsort::relocate::relocate_into_buckets;
/// use std::path::Path;
///
/// let filters = PicsortConfig::default().compile().unwrap();
/// let report = relocate_into_buckets(Path::new("/photos/2021"), &default_criteria(), &filters, false)
///     .unwrap();
/// println!("moved {} files", report.total_moved());
/// ```
pub fn relocate_into_buckets(
    base_path: &Path,
    criteria: &[Criterion],
    filters: &CompiledFilters,
    dry_run: bool,
) -> RelocateResult<ForwardReport> {
    validate_source_dir(base_path)?;

    let mut listing = DirListing::read(base_path)?;
    listing.restrict(|entry| filters.should_include(entry.path()));

    let mut report = ForwardReport {
        dry_run,
        buckets: Vec::with_capacity(criteria.len()),
    };

    for criterion in criteria {
        let matched: Vec<usize> = listing
            .candidates()
            .filter(|(_, entry)| criterion.matches(entry, &listing))
            .map(|(index, _)| index)
            .collect();

        let mut outcome = BucketOutcome::new(criterion.folder());
        if matched.is_empty() {
            report.buckets.push(outcome);
            continue;
        }

        let folder_path = base_path.join(criterion.folder());
        if folder_path.is_dir() {
            outcome.folder_existed = true;
        } else {
            outcome.created_folder = true;
            if !dry_run && let Err(e) = fs::create_dir(&folder_path) {
                let error = RelocateError::DirectoryCreationFailed {
                    path: folder_path.clone(),
                    source: e,
                };
                for index in &matched {
                    let entry = &listing.entries()[*index];
                    outcome
                        .failures
                        .push((entry.path().to_path_buf(), error.to_string()));
                }
                report.buckets.push(outcome);
                continue;
            }
        }

        for index in matched {
            let entry = &listing.entries()[index];
            let action = MoveAction::new(entry.path(), folder_path.join(entry.name()));

            if dry_run {
                outcome.moves.push(action);
                continue;
            }

            match action.execute() {
                Ok(()) => {
                    listing.consume(index);
                    outcome.moves.push(action);
                }
                Err(e) => outcome.failures.push((action.source, e.to_string())),
            }
        }

        report.buckets.push(outcome);
    }

    Ok(report)
}
