//! picsort - sort a photo folder into semantic subfolders, and back
//!
//! This library classifies the files of a flat camera-roll folder into five
//! reserved bucket folders, or into capture-month folders, and reverses that
//! without ever overwriting a file: a plain restore that refuses on name
//! collisions, a safe flatten that renames with a `__NNN` suffix, and a suffix
//! reverser that cleans those renames up later.

pub mod bucket;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod flatten;
pub mod listing;
pub mod monthly;
pub mod output;
pub mod relocate;
pub mod restore;
pub mod stats;
pub mod suffix;
pub mod timestamp;

pub use bucket::{Bucket, Criterion, default_criteria};
pub use config::{CompiledFilters, ConfigError, PicsortConfig};
pub use duplicates::find_duplicate_names;
pub use flatten::{FlattenReport, flatten_subfolders};
pub use monthly::{MonthlyReport, bucket_by_month, month_key};
pub use relocate::{ForwardReport, MoveAction, RelocateError, RelocateResult, relocate_into_buckets};
pub use restore::{RestoreReport, restore_from_buckets};
pub use suffix::{SuffixReport, reverse_suffixes};
pub use timestamp::{MetadataTimestampProvider, TimestampProvider};

pub use cli::{Mode, RunOptions, run_cli, run_cli_with_config};
