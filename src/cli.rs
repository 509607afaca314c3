//! Command-line dispatch for picsort.
//!
//! This module maps a numeric mode to one of the operations, merges the
//! configuration file with the command-line switches, and renders the
//! operation's report on the console.

use crate::bucket::default_criteria;
use crate::config::{CompiledFilters, PicsortConfig};
use crate::duplicates::find_duplicate_names;
use crate::flatten::flatten_subfolders;
use crate::monthly::bucket_by_month;
use crate::output::{OutputFormatter, plural};
use crate::relocate::{RelocateError, relocate_into_buckets, validate_existing_dir};
use crate::restore::{FolderRemoval, restore_from_buckets};
use crate::stats::{YearVerdict, folder_stats, verify_year};
use crate::suffix::reverse_suffixes;
use crate::timestamp::MetadataTimestampProvider;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Lowest accepted value for `--year`.
pub const MIN_YEAR: i32 = 1900;
/// Highest accepted value for `--year`.
pub const MAX_YEAR: i32 = 2100;

/// The operation selected by `--mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 0: file counts per extension.
    Statistics,
    /// 1: compare capture years against `--year`.
    VerifyYear,
    /// 2: report file names occurring more than once.
    DuplicateNames,
    /// 3: sort files into the five bucket folders.
    MoveToSubfolders,
    /// 4: move files back out of the bucket folders.
    MoveBackFromSubfolders,
    /// 5: sort files into capture-month folders.
    MoveToMonthFolders,
    /// 6: pull files up from immediate subfolders, renaming on collision.
    FlattenSubfolders,
    /// 7: strip rename suffixes where safe.
    RemoveRenameSuffixes,
}

impl Mode {
    /// All modes, by number.
    pub const ALL: [Mode; 8] = [
        Mode::Statistics,
        Mode::VerifyYear,
        Mode::DuplicateNames,
        Mode::MoveToSubfolders,
        Mode::MoveBackFromSubfolders,
        Mode::MoveToMonthFolders,
        Mode::FlattenSubfolders,
        Mode::RemoveRenameSuffixes,
    ];

    pub fn from_number(number: u8) -> Option<Mode> {
        Self::ALL.get(number as usize).copied()
    }

    pub fn number(&self) -> u8 {
        Self::ALL.iter().position(|m| m == self).unwrap_or_default() as u8
    }

    pub fn description(&self) -> &'static str {
        match self {
            Mode::Statistics => "show folder statistics",
            Mode::VerifyYear => "verify year",
            Mode::DuplicateNames => "show duplicate file names",
            Mode::MoveToSubfolders => "move to subfolders",
            Mode::MoveBackFromSubfolders => "move back from subfolders",
            Mode::MoveToMonthFolders => "move to month subfolders",
            Mode::FlattenSubfolders => "flatten subfolders with safe rename",
            Mode::RemoveRenameSuffixes => "remove rename suffixes",
        }
    }

    /// Returns true if the mode changes files.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Mode::Statistics | Mode::VerifyYear | Mode::DuplicateNames
        )
    }
}

/// Switches shared by all modes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Report intended changes without making them.
    pub dry_run: bool,
    /// Print every file operation.
    pub verbose: bool,
    /// Expected capture year, for [`Mode::VerifyYear`].
    pub year: Option<i32>,
}

/// Runs `mode` on `dir_path` with configuration discovered the default way.
///
/// # Examples
///
/// ```no_run
/// use picsort::cli::{Mode, RunOptions, run_cli};
/// use std::path::Path;
///
/// let options = RunOptions { dry_run: true, ..Default::default() };
/// if let Err(e) = run_cli(Mode::MoveToSubfolders, Path::new("/photos/2021"), options) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(mode: Mode, dir_path: &Path, options: RunOptions) -> Result<(), String> {
    run_cli_with_config(mode, dir_path, options, None)
}

/// Runs `mode` on `dir_path`, optionally with an explicit configuration file.
pub fn run_cli_with_config(
    mode: Mode,
    dir_path: &Path,
    options: RunOptions,
    config_path: Option<&Path>,
) -> Result<(), String> {
    let config = PicsortConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let filters = config
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let options = RunOptions {
        dry_run: options.dry_run || config.options.dry_run,
        verbose: options.verbose || config.options.verbose,
        year: options.year,
    };

    OutputFormatter::info(&format!(
        "Running program in mode: {} ({})",
        mode.number(),
        mode.description()
    ));
    if options.dry_run && mode.is_mutating() {
        OutputFormatter::dry_run_notice("No files will be changed.");
    }

    let provider = MetadataTimestampProvider::new(&config.media);
    match mode {
        Mode::Statistics => show_statistics(dir_path),
        Mode::VerifyYear => verify_capture_year(dir_path, options, &provider),
        Mode::DuplicateNames => show_duplicate_names(dir_path),
        Mode::MoveToSubfolders => move_to_subfolders(dir_path, options, &filters),
        Mode::MoveBackFromSubfolders => move_back_from_subfolders(dir_path, options),
        Mode::MoveToMonthFolders => move_to_month_folders(dir_path, options, &filters, &provider),
        Mode::FlattenSubfolders => flatten(dir_path, options),
        Mode::RemoveRenameSuffixes => remove_rename_suffixes(dir_path, options),
    }
}

fn show_statistics(dir_path: &Path) -> Result<(), String> {
    let stats = folder_stats(dir_path).map_err(|e| e.to_string())?;
    OutputFormatter::plain(&format!("Files found: {}", stats.total_files));
    OutputFormatter::summary_table("Extension", &stats.by_extension);
    print_unreadable(&stats.unreadable);
    Ok(())
}

fn print_unreadable(unreadable: &[(PathBuf, String)]) {
    for (path, reason) in unreadable {
        OutputFormatter::warning(&format!("Skipped {}: {}", path.display(), reason));
    }
}

fn verify_capture_year(
    dir_path: &Path,
    options: RunOptions,
    provider: &MetadataTimestampProvider,
) -> Result<(), String> {
    let year = options
        .year
        .ok_or_else(|| "Mode 1 requires --year".to_string())?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(format!(
            "The given year {} must be between {} and {}",
            year, MIN_YEAR, MAX_YEAR
        ));
    }

    let report = verify_year(dir_path, year, provider).map_err(|e| e.to_string())?;

    if options.verbose {
        for check in &report.checks {
            let stamp = check.timestamp.as_deref().unwrap_or("-");
            let label = match check.verdict {
                YearVerdict::Correct => "CORRECT",
                YearVerdict::Wrong => "WRONG",
                YearVerdict::Unknown => "UNKNOWN",
            };
            OutputFormatter::plain(&format!(
                "  {} capture year of {} -> exact date: {}",
                label,
                check.path.display(),
                stamp
            ));
        }
    }

    print_unreadable(&report.unreadable);

    let wrong = report.count(YearVerdict::Wrong);
    OutputFormatter::header("RESULT");
    OutputFormatter::plain(&format!("Processed files: {}", report.checks.len()));
    OutputFormatter::plain(&format!(
        "Num. files with date UNKNOWN: {}",
        report.count(YearVerdict::Unknown)
    ));
    OutputFormatter::plain(&format!(
        "Num. files with date CORRECT: {}",
        report.count(YearVerdict::Correct)
    ));
    if wrong == 0 {
        OutputFormatter::success("Num. files with date WRONG: 0");
    } else {
        OutputFormatter::warning(&format!(
            "Num. files with date WRONG: {} --> this should be 0!",
            wrong
        ));
    }
    Ok(())
}

fn show_duplicate_names(dir_path: &Path) -> Result<(), String> {
    validate_existing_dir(dir_path).map_err(|e| e.to_string())?;
    let duplicates = find_duplicate_names(dir_path).map_err(|e| e.to_string())?;

    if duplicates.is_empty() {
        OutputFormatter::success("No duplicate file names found.");
    } else {
        print_duplicates(&duplicates);
    }
    Ok(())
}

fn print_duplicates(duplicates: &BTreeMap<String, usize>) {
    OutputFormatter::warning(&format!(
        "{} file name(s) occur more than once:",
        duplicates.len()
    ));
    for (name, count) in duplicates {
        OutputFormatter::plain(&format!("  {}: {}", name, count));
    }
}

fn move_to_subfolders(
    dir_path: &Path,
    options: RunOptions,
    filters: &CompiledFilters,
) -> Result<(), String> {
    let dry_run = options.dry_run;
    let report = relocate_into_buckets(dir_path, &default_criteria(), filters, dry_run)
        .map_err(|e| e.to_string())?;

    let mut counts = BTreeMap::new();
    for bucket in &report.buckets {
        OutputFormatter::header(&bucket.folder);
        if bucket.matched() == 0 {
            OutputFormatter::action(
                dry_run,
                &format!(
                    "No matching files. Directory {} will not be created.",
                    bucket.folder
                ),
            );
            continue;
        }

        let folder_path = dir_path.join(&bucket.folder);
        if bucket.folder_existed {
            OutputFormatter::warning(&format!(
                "The subfolder {} already exists!",
                folder_path.display()
            ));
        } else if bucket.created_folder {
            OutputFormatter::action(
                dry_run,
                &format!("Create new subfolder {}", folder_path.display()),
            );
        }

        if options.verbose {
            for action in &bucket.moves {
                OutputFormatter::action(
                    dry_run,
                    &format!("  Moving file {}", action.source.display()),
                );
            }
        }
        for (path, reason) in &bucket.failures {
            OutputFormatter::error(&format!("{}: {}", path.display(), reason));
        }
        OutputFormatter::action(
            dry_run,
            &format!(
                "Moved {} {} into subfolder",
                bucket.moves.len(),
                plural(bucket.moves.len())
            ),
        );
        counts.insert(bucket.folder.clone(), bucket.moves.len());
    }

    OutputFormatter::summary_table("Folder", &counts);
    if dry_run {
        OutputFormatter::dry_run_notice(
            "A file matching several buckets is counted in each of them; a real run moves it once.",
        );
    }
    if report.total_failures() > 0 {
        OutputFormatter::warning("Some files could not be moved. Please review errors above.");
    }
    OutputFormatter::success("Done!");
    Ok(())
}

fn move_back_from_subfolders(dir_path: &Path, options: RunOptions) -> Result<(), String> {
    let dry_run = options.dry_run;
    let report = match restore_from_buckets(dir_path, dry_run) {
        Ok(report) => report,
        Err(RelocateError::DuplicateNames { duplicates }) => {
            print_duplicates(&duplicates);
            return Err(format!(
                "Restore aborted: {} file name(s) would collide. No files were moved.",
                duplicates.len()
            ));
        }
        Err(e) => return Err(e.to_string()),
    };

    for subfolder in &report.subfolders {
        let name = subfolder.bucket.dir_name();
        if !subfolder.present {
            OutputFormatter::action(dry_run, &format!("{} does not exist!", name));
            continue;
        }

        OutputFormatter::header(name);
        if options.verbose {
            for action in &subfolder.moves {
                OutputFormatter::action(
                    dry_run,
                    &format!(
                        "  Moving file {} back to parent folder",
                        action.source.display()
                    ),
                );
            }
        }
        for (path, reason) in &subfolder.failures {
            OutputFormatter::error(&format!("{}: {}", path.display(), reason));
        }
        OutputFormatter::action(
            dry_run,
            &format!(
                "Moved {} {} back from subfolder",
                subfolder.moves.len(),
                plural(subfolder.moves.len())
            ),
        );

        let folder_path = dir_path.join(name);
        match &subfolder.removal {
            Some(FolderRemoval::Removed) | Some(FolderRemoval::WouldRemove) => {
                OutputFormatter::action(
                    dry_run,
                    &format!("Removing empty subdir {}", folder_path.display()),
                );
            }
            Some(FolderRemoval::NotEmpty(left)) => OutputFormatter::warning(&format!(
                "Cannot remove subfolder {} because it is not empty ({} entries left).",
                folder_path.display(),
                left
            )),
            Some(FolderRemoval::Failed(reason)) => OutputFormatter::error(&format!(
                "Failed to remove {}: {}",
                folder_path.display(),
                reason
            )),
            None => {}
        }
    }

    OutputFormatter::plain(&format!("\nTotal files moved back: {}", report.total_moved()));
    OutputFormatter::success("Done!");
    Ok(())
}

fn move_to_month_folders(
    dir_path: &Path,
    options: RunOptions,
    filters: &CompiledFilters,
    provider: &MetadataTimestampProvider,
) -> Result<(), String> {
    let dry_run = options.dry_run;
    let progress = (!options.verbose).then(|| OutputFormatter::create_progress_bar(0));
    let result = bucket_by_month(dir_path, provider, filters, dry_run, progress.as_ref());
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    let report = result.map_err(|e| e.to_string())?;

    for (key, month) in &report.months {
        if month.created_folder {
            OutputFormatter::action(
                dry_run,
                &format!("Create new subfolder {}", dir_path.join(key).display()),
            );
        }
        if options.verbose {
            for action in &month.moves {
                OutputFormatter::action(
                    dry_run,
                    &format!(
                        "  Moving file {} to {}",
                        action.source.display(),
                        key
                    ),
                );
            }
        }
    }
    for conflict in &report.conflicts {
        OutputFormatter::warning(&format!(
            "Not moving {}: {} already exists",
            conflict.source.display(),
            conflict.destination.display()
        ));
    }
    for (path, reason) in &report.failures {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }
    if options.verbose {
        for dir in &report.removed_dirs {
            OutputFormatter::plain(&format!("Removed emptied directory {}", dir.display()));
        }
    }

    OutputFormatter::summary_table("Month", &report.counts());
    OutputFormatter::action(
        dry_run,
        &format!(
            "Moved {} {} into month folders",
            report.total_moved(),
            plural(report.total_moved())
        ),
    );
    if dry_run {
        OutputFormatter::dry_run_notice(
            "Files sharing a name and a month are each counted; a real run moves the first and refuses the rest.",
        );
    }
    OutputFormatter::success("Done!");
    Ok(())
}

fn flatten(dir_path: &Path, options: RunOptions) -> Result<(), String> {
    let report = flatten_subfolders(dir_path, options.dry_run).map_err(|e| e.to_string())?;

    if options.verbose {
        for action in &report.moves {
            OutputFormatter::plain(&format!(
                "  Moving file {} to {}",
                action.source.display(),
                action.destination.display()
            ));
        }
    }
    for action in report.renamed() {
        OutputFormatter::info(&format!(
            "Renamed to avoid collision: {} -> {}",
            action.source.display(),
            action.destination.display()
        ));
    }
    for (path, reason) in &report.failures {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }
    for dir in &report.kept_dirs {
        OutputFormatter::warning(&format!(
            "Cannot remove subfolder {} because it is not empty.",
            dir.display()
        ));
    }

    OutputFormatter::plain(&format!(
        "Moved {} {} into {} ({} renamed)",
        report.moves.len(),
        plural(report.moves.len()),
        dir_path.display(),
        report.renamed().count()
    ));
    OutputFormatter::success("Done!");
    Ok(())
}

fn remove_rename_suffixes(dir_path: &Path, options: RunOptions) -> Result<(), String> {
    let dry_run = options.dry_run;
    let report = reverse_suffixes(dir_path, dry_run).map_err(|e| e.to_string())?;

    if options.verbose {
        for action in &report.renamed {
            OutputFormatter::action(
                dry_run,
                &format!(
                    "  Renaming {} -> {}",
                    action.source.display(),
                    action.destination.display()
                ),
            );
        }
    }
    for conflict in &report.conflicts {
        OutputFormatter::warning(&format!(
            "Cannot rename {}: {} already exists",
            conflict.source.display(),
            conflict.destination.display()
        ));
    }
    for (path, reason) in &report.failures {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }

    OutputFormatter::action(
        dry_run,
        &format!(
            "Renamed {} {}, {} conflict(s)",
            report.renamed.len(),
            plural(report.renamed.len()),
            report.conflicts.len()
        ),
    );
    if dry_run {
        OutputFormatter::dry_run_notice(
            "Renames sharing one original name are each reported as safe; a real run renames only the first.",
        );
    }
    OutputFormatter::success("Done!");
    Ok(())
}
