/// Safe flatten: pulling files up from the immediate subfolders.
///
/// Unlike the plain restore, this works on any subfolder names and never
/// refuses because of collisions: a file whose name is already taken in the
/// parent gets a `__NNN` suffix instead. Only files exactly one level down are
/// moved; deeper files and the parent's own files stay where they are.
use crate::listing::{DirListing, immediate_subdirs};
use crate::relocate::{MoveAction, RelocateError, RelocateResult, validate_source_dir};
use crate::suffix::free_destination;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of a safe flatten.
#[derive(Debug, Clone, Default)]
pub struct FlattenReport {
    /// Every move performed.
    pub moves: Vec<MoveAction>,
    /// Subfolders removed because nothing was left in them.
    pub removed_dirs: Vec<PathBuf>,
    /// Subfolders that still hold entries.
    pub kept_dirs: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}

impl FlattenReport {
    /// Moves that needed a rename suffix.
    pub fn renamed(&self) -> impl Iterator<Item = &MoveAction> {
        self.moves
            .iter()
            .filter(|m| m.source.file_name() != m.destination.file_name())
    }
}

/// Moves every file of every immediate subfolder of `base_path` into `base_path`.
///
/// # Errors
///
/// Returns `RelocateError::DryRunUnsupported` when `dry_run` is set: the suffix
/// picked for one file depends on the moves made before it.
pub fn flatten_subfolders(base_path: &Path, dry_run: bool) -> RelocateResult<FlattenReport> {
    if dry_run {
        return Err(RelocateError::DryRunUnsupported {
            operation: "safe flatten",
        });
    }
    validate_source_dir(base_path)?;

    let mut report = FlattenReport::default();
    for subdir in immediate_subdirs(base_path)? {
        let listing = match DirListing::read(&subdir) {
            Ok(listing) => listing,
            Err(e) => {
                report.failures.push((subdir, e.to_string()));
                continue;
            }
        };

        for entry in listing.entries() {
            let moved = free_destination(base_path, entry.name(), entry.path()).and_then(|dest| {
                let action = MoveAction::new(entry.path(), dest);
                action.execute().map(|()| action)
            });
            match moved {
                Ok(action) => report.moves.push(action),
                Err(e) => report
                    .failures
                    .push((entry.path().to_path_buf(), e.to_string())),
            }
        }

        match fs::remove_dir(&subdir) {
            Ok(()) => report.removed_dirs.push(subdir),
            Err(_) => report.kept_dirs.push(subdir),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flatten_refuses_dry_run() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("sub")).unwrap();
        fs::write(base.join("sub/a.jpg"), "a").unwrap();

        let result = flatten_subfolders(base, true);

        assert!(matches!(
            result,
            Err(RelocateError::DryRunUnsupported { .. })
        ));
        assert!(base.join("sub/a.jpg").is_file());
    }

    #[test]
    fn test_flatten_resolves_collisions() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("one")).unwrap();
        fs::create_dir(base.join("two")).unwrap();
        fs::write(base.join("a.jpg"), "root").unwrap();
        fs::write(base.join("one/a.jpg"), "one").unwrap();
        fs::write(base.join("two/a.jpg"), "two").unwrap();

        let report = flatten_subfolders(base, false).expect("Flatten failed");

        assert_eq!(report.moves.len(), 2);
        assert_eq!(report.renamed().count(), 2);
        assert_eq!(fs::read_to_string(base.join("a.jpg")).unwrap(), "root");
        assert_eq!(fs::read_to_string(base.join("a__001.jpg")).unwrap(), "one");
        assert_eq!(fs::read_to_string(base.join("a__002.jpg")).unwrap(), "two");
        assert_eq!(report.removed_dirs.len(), 2);
    }

    #[test]
    fn test_flatten_leaves_deeper_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir_all(base.join("one/deeper")).unwrap();
        fs::write(base.join("one/a.jpg"), "a").unwrap();
        fs::write(base.join("one/deeper/b.jpg"), "b").unwrap();

        let report = flatten_subfolders(base, false).expect("Flatten failed");

        assert!(base.join("a.jpg").is_file());
        assert!(base.join("one/deeper/b.jpg").is_file());
        assert!(!base.join("b.jpg").exists());
        assert_eq!(report.kept_dirs, vec![base.join("one")]);
    }
}
