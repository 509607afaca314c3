//! The `__NNN` rename suffix and its reversal.
//!
//! A name collision during a safe flatten is resolved by inserting two
//! underscores and a zero-padded ordinal before the extension:
//! `IMG_0001.JPG` becomes `IMG_0001__001.JPG`. The reverser later strips the
//! suffix again wherever that no longer collides.

use crate::listing::walk_tree;
use crate::relocate::{
    MoveAction, RelocateError, RelocateResult, path_taken, validate_source_dir,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Highest ordinal that still fits the three-digit suffix.
pub const MAX_SUFFIX_ORDINAL: u16 = 999;

static SUFFIXED_STEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(.+)__[0-9]{3}$").expect("suffix pattern is valid"));

fn split_name(name: &str) -> (String, Option<String>) {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => (
            stem.to_string_lossy().into_owned(),
            Some(ext.to_string_lossy().into_owned()),
        ),
        _ => (name.to_string(), None),
    }
}

/// Inserts `__NNN` before the extension of `name`.
///
/// # Examples
///
/// ```
/// use picsort::suffix::with_suffix;
///
/// assert_eq!(with_suffix("IMG_0001.JPG", 3), "IMG_0001__003.JPG");
/// assert_eq!(with_suffix("README", 1), "README__001");
/// ```
pub fn with_suffix(name: &str, ordinal: u16) -> String {
    match split_name(name) {
        (stem, Some(ext)) => format!("{}__{:03}.{}", stem, ordinal, ext),
        (stem, None) => format!("{}__{:03}", stem, ordinal),
    }
}

/// Returns the name without its trailing `__NNN`, or `None` if it carries no suffix.
///
/// # Examples
///
/// ```
/// use picsort::suffix::strip_suffix;
///
/// assert_eq!(strip_suffix("IMG_0001__003.JPG").as_deref(), Some("IMG_0001.JPG"));
/// assert_eq!(strip_suffix("IMG_0001.JPG"), None);
/// ```
pub fn strip_suffix(name: &str) -> Option<String> {
    let (stem, ext) = split_name(name);
    let original = SUFFIXED_STEM.captures(&stem)?.get(1)?.as_str();
    Some(match ext {
        Some(ext) => format!("{}.{}", original, ext),
        None => original.to_string(),
    })
}

/// Picks a free destination for `name` inside `dir`.
///
/// The plain name is used when nothing occupies it; otherwise ordinals from 1
/// upwards are tried until a free suffixed name turns up.
pub fn free_destination(dir: &Path, name: &str, source: &Path) -> RelocateResult<PathBuf> {
    let plain = dir.join(name);
    if !path_taken(&plain) {
        return Ok(plain);
    }

    (1..=MAX_SUFFIX_ORDINAL)
        .map(|ordinal| dir.join(with_suffix(name, ordinal)))
        .find(|candidate| !path_taken(candidate))
        .ok_or_else(|| RelocateError::NoFreeSuffix {
            source: source.to_path_buf(),
            dir: dir.to_path_buf(),
        })
}

/// Result of a suffix reversal pass.
#[derive(Debug, Clone, Default)]
pub struct SuffixReport {
    pub dry_run: bool,
    /// Renames performed, or judged safe under dry run.
    pub renamed: Vec<MoveAction>,
    /// Renames refused because the unsuffixed name is taken.
    pub conflicts: Vec<MoveAction>,
    pub failures: Vec<(PathBuf, String)>,
}

/// Strips the rename suffix from every file under `base_path` where that is safe.
///
/// Files are visited in sorted walk order and each is checked against the
/// filesystem as it stands. Under dry run no rename happens, so two suffixed
/// files sharing one original name are both reported as safe even though a real
/// run would rename the first and refuse the second.
pub fn reverse_suffixes(base_path: &Path, dry_run: bool) -> RelocateResult<SuffixReport> {
    validate_source_dir(base_path)?;

    let walk = walk_tree(base_path)?;
    let mut report = SuffixReport {
        dry_run,
        failures: walk.unreadable,
        ..Default::default()
    };

    for path in walk.files {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let Some(original) = strip_suffix(&name) else {
            continue;
        };
        let Some(parent) = path.parent() else {
            continue;
        };

        let action = MoveAction::new(&path, parent.join(original));
        if path_taken(&action.destination) {
            report.conflicts.push(action);
            continue;
        }
        if dry_run {
            report.renamed.push(action);
            continue;
        }
        match action.execute() {
            Ok(()) => report.renamed.push(action),
            Err(e) => report.failures.push((action.source, e.to_string())),
        }
    }

    Ok(report)
}
