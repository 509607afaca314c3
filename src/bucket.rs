/// Photo buckets and the ordered rules that fill them.
///
/// A flat camera-roll folder is split into five reserved subfolders. Each folder
/// is bound to a [`Criterion`], and the criteria are evaluated strictly in the
/// order returned by [`default_criteria`]: a file consumed by an earlier bucket is
/// no longer a candidate (nor a sibling) for the later ones.
///
/// # Examples
///
/// ```
/// use picsort::bucket::Bucket;
///
/// assert_eq!(Bucket::Original.dir_name(), "_Originals");
/// assert!(Bucket::is_reserved_name("Pics_and_Movies"));
/// assert!(!Bucket::is_reserved_name("Holidays 2021"));
/// ```
use crate::listing::{DirListing, FileEntry};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// `IMG_*.jpg`, `IMG_*.jpeg` or `IMG_*.mov`, any case.
static CAMERA_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^img_.*\.(jpg|jpeg|mov)$").expect("camera name pattern is valid")
});

/// One of the five fixed file categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Apple edit sidecars (`*.AAE`).
    EditData,
    /// Everything not named like a camera shot: messenger images, downloads, screenshots.
    Imported,
    /// The video half of a live photo.
    LiveImage,
    /// An unedited shot whose edited `IMG_E` counterpart is present.
    Original,
    /// Plain camera pictures and movies.
    Remaining,
}

impl Bucket {
    /// All buckets, in classification order.
    pub const ALL: [Bucket; 5] = [
        Bucket::EditData,
        Bucket::Imported,
        Bucket::LiveImage,
        Bucket::Original,
        Bucket::Remaining,
    ];

    /// Returns the reserved subfolder name for this bucket.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Bucket::EditData => "_EditDataAAE",
            Bucket::Imported => "_WhatsApp,Downloads,etc",
            Bucket::LiveImage => "_LiveImages",
            Bucket::Original => "_Originals",
            Bucket::Remaining => "Pics_and_Movies",
        }
    }

    /// Returns a human-readable description of this bucket.
    pub fn description(&self) -> &'static str {
        match self {
            Bucket::EditData => "Edit data (AAE sidecars)",
            Bucket::Imported => "WhatsApp, downloads and other imports",
            Bucket::LiveImage => "Live image videos",
            Bucket::Original => "Originals of edited pictures",
            Bucket::Remaining => "Pictures and movies",
        }
    }

    /// Looks up the bucket owning a reserved folder name.
    pub fn from_dir_name(name: &str) -> Option<Bucket> {
        Self::ALL.into_iter().find(|b| b.dir_name() == name)
    }

    /// Returns true if `name` is one of the five reserved folder names.
    pub fn is_reserved_name(name: &str) -> bool {
        Self::from_dir_name(name).is_some()
    }

    /// Returns the classification rule for this bucket.
    pub fn criterion(self) -> Criterion {
        let predicate: fn(&FileEntry, &DirListing) -> bool = match self {
            Bucket::EditData => is_edit_data,
            Bucket::Imported => is_imported,
            Bucket::LiveImage => is_live_image,
            Bucket::Original => is_original,
            Bucket::Remaining => is_remaining,
        };
        Criterion::new(self.dir_name(), predicate)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A named predicate deciding which files of a directory go into `folder`.
///
/// The predicate sees the candidate file and the directory listing as it stands
/// at evaluation time, so it may look at siblings.
pub struct Criterion {
    folder: String,
    predicate: Box<dyn Fn(&FileEntry, &DirListing) -> bool>,
}

impl Criterion {
    /// Creates a criterion moving matches into the subfolder `folder`.
    pub fn new<F>(folder: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&FileEntry, &DirListing) -> bool + 'static,
    {
        Self {
            folder: folder.into(),
            predicate: Box::new(predicate),
        }
    }

    /// The destination subfolder name.
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Evaluates the predicate against one file.
    pub fn matches(&self, entry: &FileEntry, listing: &DirListing) -> bool {
        (self.predicate)(entry, listing)
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Criterion")
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}

/// The five bucket criteria in their load-bearing order.
pub fn default_criteria() -> Vec<Criterion> {
    Bucket::ALL.into_iter().map(Bucket::criterion).collect()
}

/// Returns true for names shaped like a camera shot (`IMG_*.jpg|jpeg|mov`, any case).
pub fn is_camera_name(name: &str) -> bool {
    CAMERA_NAME.is_match(name)
}

fn is_edit_data(entry: &FileEntry, _listing: &DirListing) -> bool {
    entry.extension() == Some("aae")
}

fn is_imported(entry: &FileEntry, _listing: &DirListing) -> bool {
    !is_camera_name(entry.name())
}

fn is_live_image(entry: &FileEntry, listing: &DirListing) -> bool {
    entry.extension() == Some("mov")
        && listing.has_sibling(|sibling| {
            sibling.stem() == entry.stem() && matches!(sibling.extension(), Some("jpg" | "jpeg"))
        })
}

fn is_original(entry: &FileEntry, listing: &DirListing) -> bool {
    entry.name().starts_with("IMG_") && listing.contains(&entry.name().replacen("IMG_", "IMG_E", 1))
}

fn is_remaining(entry: &FileEntry, _listing: &DirListing) -> bool {
    is_camera_name(entry.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn listing(names: &[&str]) -> DirListing {
        DirListing::from_names(Path::new("/photos"), names.iter().copied())
    }

    fn matches(bucket: Bucket, name: &str, names: &[&str]) -> bool {
        let listing = listing(names);
        let entry = listing
            .entries()
            .iter()
            .find(|e| e.name() == name)
            .expect("entry in listing");
        bucket.criterion().matches(entry, &listing)
    }

    #[test]
    fn test_bucket_dir_names() {
        assert_eq!(Bucket::EditData.dir_name(), "_EditDataAAE");
        assert_eq!(Bucket::Imported.dir_name(), "_WhatsApp,Downloads,etc");
        assert_eq!(Bucket::LiveImage.dir_name(), "_LiveImages");
        assert_eq!(Bucket::Original.dir_name(), "_Originals");
        assert_eq!(Bucket::Remaining.dir_name(), "Pics_and_Movies");
    }

    #[test]
    fn test_reserved_names_round_trip() {
        for bucket in Bucket::ALL {
            assert_eq!(Bucket::from_dir_name(bucket.dir_name()), Some(bucket));
        }
        assert_eq!(Bucket::from_dir_name("_originals"), None);
    }

    #[test]
    fn test_default_criteria_order() {
        let folders: Vec<_> = default_criteria()
            .iter()
            .map(|c| c.folder().to_string())
            .collect();
        assert_eq!(
            folders,
            vec![
                "_EditDataAAE",
                "_WhatsApp,Downloads,etc",
                "_LiveImages",
                "_Originals",
                "Pics_and_Movies"
            ]
        );
    }

    #[test]
    fn test_edit_data_extension_case_insensitive() {
        assert!(matches(Bucket::EditData, "IMG_0001.AAE", &["IMG_0001.AAE"]));
        assert!(matches(Bucket::EditData, "IMG_0001.aae", &["IMG_0001.aae"]));
        assert!(!matches(Bucket::EditData, "IMG_0001.JPG", &["IMG_0001.JPG"]));
    }

    #[test]
    fn test_camera_name_pattern() {
        assert!(is_camera_name("IMG_0001.JPG"));
        assert!(is_camera_name("img_0001.jpeg"));
        assert!(is_camera_name("IMG_E0001.Mov"));
        assert!(!is_camera_name("IMG_0001.PNG"));
        assert!(!is_camera_name("IMG-20210101-WA0001.jpg"));
        assert!(!is_camera_name("Screenshot.jpg"));
        assert!(!is_camera_name("xIMG_0001.JPG"));
    }

    #[test]
    fn test_imported_is_complement_of_camera_name() {
        assert!(matches(Bucket::Imported, "download.png", &["download.png"]));
        assert!(!matches(Bucket::Imported, "IMG_0001.JPG", &["IMG_0001.JPG"]));
        assert!(matches(Bucket::Remaining, "IMG_0001.JPG", &["IMG_0001.JPG"]));
    }

    #[test]
    fn test_live_image_needs_still_sibling() {
        assert!(matches(
            Bucket::LiveImage,
            "IMG_0433.MOV",
            &["IMG_0433.MOV", "IMG_0433.JPG"]
        ));
        assert!(matches(
            Bucket::LiveImage,
            "IMG_0433.mov",
            &["IMG_0433.mov", "IMG_0433.jpeg"]
        ));
        assert!(!matches(Bucket::LiveImage, "IMG_0433.MOV", &["IMG_0433.MOV"]));
        assert!(!matches(
            Bucket::LiveImage,
            "IMG_0433.MOV",
            &["IMG_0433.MOV", "IMG_0434.JPG"]
        ));
    }

    #[test]
    fn test_original_needs_edited_sibling() {
        assert!(matches(
            Bucket::Original,
            "IMG_0072.JPG",
            &["IMG_0072.JPG", "IMG_E0072.JPG"]
        ));
        assert!(!matches(Bucket::Original, "IMG_0072.JPG", &["IMG_0072.JPG"]));
        assert!(!matches(
            Bucket::Original,
            "IMG_E0072.JPG",
            &["IMG_0072.JPG", "IMG_E0072.JPG"]
        ));
    }

    #[test]
    fn test_consumed_sibling_is_invisible() {
        let mut listing = listing(&["IMG_0433.MOV", "IMG_0433.JPG"]);
        let still = listing
            .entries()
            .iter()
            .position(|e| e.name() == "IMG_0433.JPG")
            .unwrap();
        listing.consume(still);
        let movie = &listing.entries()[1 - still];
        assert!(!Bucket::LiveImage.criterion().matches(movie, &listing));
    }
}
