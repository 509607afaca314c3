//! Capture timestamps read from image and video metadata.
//!
//! The relocation code only needs "when was this taken", as a string whose
//! first seven characters are `YYYY-MM` (or `YYYY:MM`). It sees that through
//! the [`TimestampProvider`] trait, so the metadata backend can be swapped,
//! and tests can supply dates without real media files.

use crate::config::MediaConfig;
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

/// Format every decoded timestamp is rendered in.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Source of capture timestamps.
pub trait TimestampProvider {
    /// Returns the capture timestamp of `path`, or `None` if it is unknown.
    fn capture_timestamp(&self, path: &Path) -> Option<String>;

    /// Returns true if this provider knows how to date `path` at all.
    fn handles(&self, _path: &Path) -> bool {
        true
    }
}

impl<F> TimestampProvider for F
where
    F: Fn(&Path) -> Option<String>,
{
    fn capture_timestamp(&self, path: &Path) -> Option<String> {
        self(path)
    }
}

/// Which metadata a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

/// Reads EXIF dates from images and QuickTime dates from videos.
#[derive(Debug, Clone)]
pub struct MetadataTimestampProvider {
    image_extensions: HashSet<String>,
    video_extensions: HashSet<String>,
}

impl MetadataTimestampProvider {
    pub fn new(media: &MediaConfig) -> Self {
        let normalize = |exts: &[String]| -> HashSet<String> {
            exts.iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect()
        };
        Self {
            image_extensions: normalize(&media.image_extensions),
            video_extensions: normalize(&media.video_extensions),
        }
    }

    /// Routes `path` by its extension, case-insensitively.
    pub fn media_kind(&self, path: &Path) -> MediaKind {
        let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
            return MediaKind::Other;
        };
        if self.image_extensions.contains(&ext) {
            MediaKind::Image
        } else if self.video_extensions.contains(&ext) {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }
}

impl Default for MetadataTimestampProvider {
    fn default() -> Self {
        Self::new(&MediaConfig::default())
    }
}

impl TimestampProvider for MetadataTimestampProvider {
    fn capture_timestamp(&self, path: &Path) -> Option<String> {
        match self.media_kind(path) {
            MediaKind::Image => image_timestamp(path),
            MediaKind::Video => video_timestamp(path),
            MediaKind::Other => None,
        }
    }

    fn handles(&self, path: &Path) -> bool {
        self.media_kind(path) != MediaKind::Other
    }
}

#[allow(deprecated)]
fn image_timestamp(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let iter = nom_exif::parse_exif(file, None).ok()??;
    let exif: nom_exif::Exif = iter.into();

    [nom_exif::ExifTag::DateTimeOriginal, nom_exif::ExifTag::CreateDate]
        .into_iter()
        .find_map(|tag| exif.get(tag).and_then(entry_timestamp))
}

#[allow(deprecated)]
fn video_timestamp(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let entries = nom_exif::parse_metadata(file).ok()?;

    ["com.apple.quicktime.creationdate", "creation_time"]
        .into_iter()
        .find_map(|key| {
            entries
                .iter()
                .filter(|(k, _)| k == key)
                .find_map(|(_, v)| entry_timestamp(v))
        })
}

fn entry_timestamp(entry: &nom_exif::EntryValue) -> Option<String> {
    if let Some(dt) = entry.as_time() {
        return Some(dt.format(TIMESTAMP_FORMAT).to_string());
    }
    entry.as_str().and_then(normalize_timestamp)
}

/// Rewrites common metadata date strings as `YYYY-MM-DDTHH:MM:SS`.
///
/// Strings in an unknown layout are returned trimmed but otherwise untouched;
/// empty strings yield `None`.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    const FORMATS: [&str; 4] = [
        "%Y:%m:%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];

    let trimmed = raw.trim().trim_end_matches('\0');
    if trimmed.is_empty() {
        return None;
    }

    // Offsets and sub-seconds are dropped, only the local wall-clock part matters.
    let head: String = trimmed.chars().take(19).collect();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&head, fmt).ok())
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .or_else(|| Some(trimmed.to_string()))
}
