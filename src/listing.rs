//! Directory listings used by every relocation pass.
//!
//! A [`DirListing`] is read once per operation and then addressed by index.
//! Entries that a pass has moved away are marked consumed rather than removed,
//! so the listing always mirrors what is left in the directory.

use crate::relocate::{RelocateError, RelocateResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A regular file directly inside the directory being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    name: String,
    stem: String,
    extension: Option<String>,
    path: PathBuf,
}

impl FileEntry {
    /// Builds an entry for `name` inside `dir`.
    pub fn new(dir: &Path, name: &str) -> Self {
        let as_path = Path::new(name);
        let stem = as_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        let extension = as_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        Self {
            name: name.to_string(),
            stem,
            extension,
            path: dir.join(name),
        }
    }

    /// Base file name, extension included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name without its last extension.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Lowercased extension, without the dot.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Full path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the file.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// The regular files of one directory, in file-name order.
#[derive(Debug, Clone)]
pub struct DirListing {
    dir: PathBuf,
    entries: Vec<FileEntry>,
    present: Vec<bool>,
    eligible: Vec<bool>,
}

impl DirListing {
    /// Lists the regular files directly inside `dir`. Subdirectories are ignored.
    pub fn read(dir: &Path) -> RelocateResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| RelocateError::DirectoryReadFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut names = Vec::new();
        for entry in entries.flatten() {
            if let Ok(file_type) = entry.file_type()
                && file_type.is_file()
            {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        Ok(Self::from_names(dir, names))
    }

    /// Builds a listing from names without touching the filesystem.
    pub fn from_names<I, S>(dir: &Path, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<FileEntry> = names
            .into_iter()
            .map(|name| FileEntry::new(dir, name.as_ref()))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let len = entries.len();

        Self {
            dir: dir.to_path_buf(),
            entries,
            present: vec![true; len],
            eligible: vec![true; len],
        }
    }

    /// The listed directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All entries, consumed ones included.
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Excludes entries rejected by `keep` from [`candidates`](Self::candidates).
    ///
    /// Excluded entries stay visible as siblings: they are still on disk.
    pub fn restrict(&mut self, keep: impl Fn(&FileEntry) -> bool) {
        for (slot, entry) in self.eligible.iter_mut().zip(&self.entries) {
            *slot = *slot && keep(entry);
        }
    }

    /// Entries still present and eligible for classification, with their index.
    pub fn candidates(&self) -> impl Iterator<Item = (usize, &FileEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, _)| self.present[*i] && self.eligible[*i])
    }

    /// Marks an entry as moved out of the directory.
    pub fn consume(&mut self, index: usize) {
        if let Some(slot) = self.present.get_mut(index) {
            *slot = false;
        }
    }

    /// Returns true if a file named `name` is still present.
    pub fn contains(&self, name: &str) -> bool {
        self.has_sibling(|entry| entry.name == name)
    }

    /// Returns true if any still-present entry satisfies `predicate`.
    pub fn has_sibling(&self, predicate: impl Fn(&FileEntry) -> bool) -> bool {
        self.entries
            .iter()
            .zip(&self.present)
            .any(|(entry, present)| *present && predicate(entry))
    }
}

/// Recursively lists every regular file under `root`, in sorted walk order.
pub fn walk_files(root: &Path) -> RelocateResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| RelocateError::DirectoryReadFailed {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Files found by [`walk_tree`], plus the entries the walk could not read.
#[derive(Debug, Default)]
pub struct TreeWalk {
    pub files: Vec<PathBuf>,
    pub unreadable: Vec<(PathBuf, String)>,
}

/// Like [`walk_files`], but an unreadable entry below `root` is recorded and
/// skipped instead of ending the walk. Only a failure on `root` itself is an error.
pub fn walk_tree(root: &Path) -> RelocateResult<TreeWalk> {
    let mut walk = TreeWalk::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    walk.files.push(entry.into_path());
                }
            }
            Err(e) if e.depth() == 0 => {
                return Err(RelocateError::DirectoryReadFailed {
                    path: root.to_path_buf(),
                    source: e.into(),
                });
            }
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                walk.unreadable.push((path, e.to_string()));
            }
        }
    }
    Ok(walk)
}

/// Lists the directories directly inside `dir`, sorted by name.
pub fn immediate_subdirs(dir: &Path) -> RelocateResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| RelocateError::DirectoryReadFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_entry_attributes() {
        let entry = FileEntry::new(Path::new("/photos"), "IMG_0001.JPG");
        assert_eq!(entry.name(), "IMG_0001.JPG");
        assert_eq!(entry.stem(), "IMG_0001");
        assert_eq!(entry.extension(), Some("jpg"));
        assert_eq!(entry.parent(), Path::new("/photos"));
    }

    #[test]
    fn test_file_entry_without_extension() {
        let entry = FileEntry::new(Path::new("/photos"), "README");
        assert_eq!(entry.stem(), "README");
        assert_eq!(entry.extension(), None);
    }

    #[test]
    fn test_read_lists_only_files_sorted() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("b.jpg"), "b").unwrap();
        fs::write(temp_dir.path().join("a.jpg"), "a").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();

        let listing = DirListing::read(temp_dir.path()).expect("Failed to list");
        let names: Vec<_> = listing.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_read_missing_dir_fails() {
        let result = DirListing::read(Path::new("/non/existent/path"));
        assert!(result.is_err());
    }

    #[test]
    fn test_consume_hides_entry() {
        let mut listing = DirListing::from_names(Path::new("/p"), ["a.jpg", "b.jpg"]);
        listing.consume(0);
        assert!(!listing.contains("a.jpg"));
        assert!(listing.contains("b.jpg"));
        assert_eq!(listing.candidates().count(), 1);
        assert_eq!(listing.len(), 2);
    }

    #[test]
    fn test_restrict_keeps_sibling_visibility() {
        let mut listing = DirListing::from_names(Path::new("/p"), ["a.jpg", ".hidden"]);
        listing.restrict(|e| !e.name().starts_with('.'));
        assert_eq!(listing.candidates().count(), 1);
        assert!(listing.contains(".hidden"));
    }

    #[test]
    fn test_walk_files_recurses() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir_all(temp_dir.path().join("x/y")).unwrap();
        fs::write(temp_dir.path().join("top.jpg"), "1").unwrap();
        fs::write(temp_dir.path().join("x/y/deep.jpg"), "2").unwrap();

        let files = walk_files(temp_dir.path()).expect("Failed to walk");
        assert_eq!(files.len(), 2);
        assert!(files.contains(&temp_dir.path().join("x/y/deep.jpg")));
    }

    #[test]
    fn test_walk_tree_matches_walk_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir_all(temp_dir.path().join("x")).unwrap();
        fs::write(temp_dir.path().join("top.jpg"), "1").unwrap();
        fs::write(temp_dir.path().join("x/inner.jpg"), "2").unwrap();

        let walk = walk_tree(temp_dir.path()).expect("Failed to walk");
        assert_eq!(walk.files, walk_files(temp_dir.path()).unwrap());
        assert!(walk.unreadable.is_empty());
        assert!(walk_tree(Path::new("/non/existent/path")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_tree_skips_unreadable_subdir() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.jpg"), "1").unwrap();
        fs::write(temp_dir.path().join("top.jpg"), "2").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop a privileged user.
        let bypassed = fs::read_dir(&locked).is_ok();
        let walk = walk_tree(temp_dir.path());
        let strict = walk_files(temp_dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if bypassed {
            return;
        }

        let walk = walk.expect("Unreadable subdir ended the walk");
        assert_eq!(walk.files, vec![temp_dir.path().join("top.jpg")]);
        assert_eq!(walk.unreadable.len(), 1);
        assert_eq!(walk.unreadable[0].0, locked);
        assert!(strict.is_err());
    }

    #[test]
    fn test_immediate_subdirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir_all(temp_dir.path().join("b/nested")).unwrap();
        fs::create_dir(temp_dir.path().join("a")).unwrap();
        fs::write(temp_dir.path().join("file.jpg"), "1").unwrap();

        let dirs = immediate_subdirs(temp_dir.path()).expect("Failed to list");
        assert_eq!(
            dirs,
            vec![temp_dir.path().join("a"), temp_dir.path().join("b")]
        );
    }
}
