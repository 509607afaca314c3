/// Plain restore: moving files back out of the bucket subfolders.
///
/// This is the inverse of the forward relocation. It only runs when every file
/// name in the tree is unique, so moving everything into one folder cannot
/// collide. Emptied bucket folders are removed; a bucket folder that still holds
/// something (a nested directory, say) is left alone and reported.
use crate::bucket::Bucket;
use crate::duplicates::find_duplicate_names;
use crate::listing::DirListing;
use crate::relocate::{MoveAction, RelocateError, RelocateResult, validate_source_dir};
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to a bucket folder after its files were moved out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderRemoval {
    /// The folder was empty and has been removed.
    Removed,
    /// Dry run: the folder would be empty and would be removed.
    WouldRemove,
    /// The folder still holds this many entries and was left in place.
    NotEmpty(usize),
    /// Removal was attempted and failed.
    Failed(String),
}

/// The restore outcome of a single bucket folder.
#[derive(Debug, Clone)]
pub struct SubfolderRestore {
    pub bucket: Bucket,
    /// False if the folder did not exist.
    pub present: bool,
    pub moves: Vec<MoveAction>,
    pub failures: Vec<(PathBuf, String)>,
    pub removal: Option<FolderRemoval>,
}

impl SubfolderRestore {
    fn new(bucket: Bucket, present: bool) -> Self {
        Self {
            bucket,
            present,
            moves: Vec::new(),
            failures: Vec::new(),
            removal: None,
        }
    }
}

/// Result of a plain restore.
#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub dry_run: bool,
    pub subfolders: Vec<SubfolderRestore>,
}

impl RestoreReport {
    pub fn total_moved(&self) -> usize {
        self.subfolders.iter().map(|s| s.moves.len()).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.subfolders.iter().map(|s| s.failures.len()).sum()
    }
}

/// Moves the files of every bucket folder under `base_path` back into it.
///
/// # Errors
///
/// Returns `RelocateError::DuplicateNames` without touching anything if any
/// file name occurs twice anywhere under `base_path`.
pub fn restore_from_buckets(base_path: &Path, dry_run: bool) -> RelocateResult<RestoreReport> {
    validate_source_dir(base_path)?;

    let duplicates = find_duplicate_names(base_path)?;
    if !duplicates.is_empty() {
        return Err(RelocateError::DuplicateNames { duplicates });
    }

    let mut report = RestoreReport {
        dry_run,
        subfolders: Vec::with_capacity(Bucket::ALL.len()),
    };

    for bucket in Bucket::ALL {
        let folder = base_path.join(bucket.dir_name());
        if !folder.is_dir() {
            report.subfolders.push(SubfolderRestore::new(bucket, false));
            continue;
        }

        let mut outcome = SubfolderRestore::new(bucket, true);
        let listing = DirListing::read(&folder)?;
        for entry in listing.entries() {
            let action = MoveAction::new(entry.path(), base_path.join(entry.name()));
            if dry_run {
                outcome.moves.push(action);
                continue;
            }
            match action.execute() {
                Ok(()) => outcome.moves.push(action),
                Err(e) => outcome.failures.push((action.source, e.to_string())),
            }
        }

        outcome.removal = Some(remove_if_empty(&folder, dry_run, listing.len())?);
        report.subfolders.push(outcome);
    }

    Ok(report)
}

/// Removes `folder` if nothing is left in it. Never forces a removal.
///
/// Under dry run the files of the listing are still there, so `planned` of the
/// remaining entries are discounted.
fn remove_if_empty(folder: &Path, dry_run: bool, planned: usize) -> RelocateResult<FolderRemoval> {
    let remaining = fs::read_dir(folder)
        .map_err(|e| RelocateError::DirectoryReadFailed {
            path: folder.to_path_buf(),
            source: e,
        })?
        .count();

    if dry_run {
        let left = remaining.saturating_sub(planned);
        return Ok(if left == 0 {
            FolderRemoval::WouldRemove
        } else {
            FolderRemoval::NotEmpty(left)
        });
    }

    if remaining > 0 {
        return Ok(FolderRemoval::NotEmpty(remaining));
    }

    Ok(match fs::remove_dir(folder) {
        Ok(()) => FolderRemoval::Removed,
        Err(e) => FolderRemoval::Failed(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_restore_moves_back_and_removes_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("_Originals")).unwrap();
        fs::create_dir(base.join("Pics_and_Movies")).unwrap();
        fs::write(base.join("_Originals/IMG_0001.JPG"), "1").unwrap();
        fs::write(base.join("Pics_and_Movies/IMG_E0001.JPG"), "2").unwrap();

        let report = restore_from_buckets(base, false).expect("Restore failed");

        assert_eq!(report.total_moved(), 2);
        assert!(base.join("IMG_0001.JPG").is_file());
        assert!(base.join("IMG_E0001.JPG").is_file());
        assert!(!base.join("_Originals").exists());
        assert!(!base.join("Pics_and_Movies").exists());
        let missing = report.subfolders.iter().filter(|s| !s.present).count();
        assert_eq!(missing, 3);
    }

    #[test]
    fn test_restore_aborts_on_duplicate_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("_Originals")).unwrap();
        fs::create_dir(base.join("Pics_and_Movies")).unwrap();
        fs::write(base.join("_Originals/IMG_0001.JPG"), "1").unwrap();
        fs::write(base.join("Pics_and_Movies/IMG_0001.JPG"), "2").unwrap();

        let result = restore_from_buckets(base, false);

        match result {
            Err(RelocateError::DuplicateNames { duplicates }) => {
                assert_eq!(duplicates.get("IMG_0001.JPG"), Some(&2));
            }
            other => panic!("Expected duplicate names error, got {:?}", other),
        }
        assert!(base.join("_Originals/IMG_0001.JPG").is_file());
        assert!(base.join("Pics_and_Movies/IMG_0001.JPG").is_file());
    }

    #[test]
    fn test_restore_keeps_folder_with_nested_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir_all(base.join("_LiveImages/nested")).unwrap();
        fs::write(base.join("_LiveImages/IMG_0001.MOV"), "1").unwrap();

        let report = restore_from_buckets(base, false).expect("Restore failed");

        assert!(base.join("IMG_0001.MOV").is_file());
        assert!(base.join("_LiveImages/nested").is_dir());
        let live = report
            .subfolders
            .iter()
            .find(|s| s.bucket == Bucket::LiveImage)
            .unwrap();
        assert_eq!(live.removal, Some(FolderRemoval::NotEmpty(1)));
    }

    #[test]
    fn test_restore_dry_run_changes_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("_EditDataAAE")).unwrap();
        fs::write(base.join("_EditDataAAE/IMG_0001.AAE"), "1").unwrap();

        let report = restore_from_buckets(base, true).expect("Dry run failed");

        assert_eq!(report.total_moved(), 1);
        assert!(base.join("_EditDataAAE/IMG_0001.AAE").is_file());
        assert!(!base.join("IMG_0001.AAE").exists());
        assert_eq!(
            report.subfolders[0].removal,
            Some(FolderRemoval::WouldRemove)
        );
    }

    #[test]
    fn test_restore_rejects_reserved_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let reserved = temp_dir.path().join("Pics_and_Movies");
        fs::create_dir(&reserved).unwrap();
        fs::write(reserved.join("IMG_0001.JPG"), "1").unwrap();

        let result = restore_from_buckets(&reserved, false);
        assert!(matches!(
            result,
            Err(RelocateError::ReservedFolderName { .. })
        ));
        assert!(reserved.join("IMG_0001.JPG").is_file());
    }
}
