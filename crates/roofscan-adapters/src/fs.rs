//! Filesystem adapter for collecting inspection photos.

use std::path::{Path, PathBuf};

use roofscan_core::domain::{PhotoCategory, PhotoInput};
use tracing::{debug, warn};

/// Extensions the image decoder handles.
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif", "gif"];

/// Collects photos from files and directories and tags them with a category.
///
/// The category of each photo is taken from, in order: the override, a
/// filename prefix naming a category (`gutters_01.jpg`, `chimney-north.png`),
/// or the nearest directory below the scanned root that names one
/// (`job-17/flashing/IMG_0042.jpg`). Anything else is `general`.
#[derive(Debug, Clone)]
pub struct FsPhotoSource {
    paths: Vec<PathBuf>,
    recursive: bool,
    category_override: Option<PhotoCategory>,
}

impl FsPhotoSource {
    /// Creates a new filesystem photo source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self {
            paths,
            recursive,
            category_override: None,
        }
    }

    /// Forces every photo into `category`.
    #[must_use]
    pub const fn with_category(mut self, category: Option<PhotoCategory>) -> Self {
        self.category_override = category;
        self
    }

    /// Returns the photos in a stable order (arguments first, then sorted
    /// directory entries).
    #[must_use]
    pub fn photos(&self) -> Vec<PhotoInput> {
        let mut found = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_photo(path) {
                    let root = path.parent().unwrap_or(path);
                    found.push((path.clone(), root.to_path_buf()));
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, path, &mut found);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        debug!("Found {} photo(s)", found.len());
        found
            .into_iter()
            .map(|(path, root)| {
                let category = self
                    .category_override
                    .unwrap_or_else(|| infer_category(&path, &root));
                PhotoInput::from_path(path, category)
            })
            .collect()
    }

    fn collect_from_dir(&self, root: &Path, dir: &Path, found: &mut Vec<(PathBuf, PathBuf)>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            if path.is_file() && is_supported_photo(&path) {
                found.push((path, root.to_path_buf()));
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(root, &path, found);
            }
        }
    }
}

/// Infers the roof component from a photo's filename or enclosing directories.
///
/// Directories are searched from the photo upwards, including `root` itself
/// but nothing above it.
#[must_use]
pub fn infer_category(path: &Path, root: &Path) -> PhotoCategory {
    let prefix = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| stem.split(['_', '-', ' ', '.']).next())
        .and_then(PhotoCategory::from_name);
    if let Some(category) = prefix {
        return category;
    }

    for dir in path.ancestors().skip(1) {
        if let Some(category) = dir
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(PhotoCategory::from_name)
        {
            return category;
        }
        if dir == root {
            break;
        }
    }

    PhotoCategory::General
}

/// Checks if a path has a supported photo extension.
fn is_supported_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| PHOTO_EXTENSIONS.contains(&e.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_photo() {
        assert!(is_supported_photo(Path::new("roof.jpg")));
        assert!(is_supported_photo(Path::new("roof.JPEG")));
        assert!(is_supported_photo(Path::new("roof.webp")));
        assert!(is_supported_photo(Path::new("roof.tif")));
        assert!(!is_supported_photo(Path::new("roof.cr2")));
        assert!(!is_supported_photo(Path::new("notes.txt")));
        assert!(!is_supported_photo(Path::new("roof")));
    }

    #[test]
    fn test_infer_from_filename_prefix() {
        let root = Path::new("/jobs/17");
        assert_eq!(
            infer_category(Path::new("/jobs/17/gutter_01.jpg"), root),
            PhotoCategory::Gutters
        );
        assert_eq!(
            infer_category(Path::new("/jobs/17/Chimney-north.png"), root),
            PhotoCategory::Chimney
        );
    }

    #[test]
    fn test_infer_from_nearest_directory() {
        let root = Path::new("/jobs/17");
        assert_eq!(
            infer_category(Path::new("/jobs/17/vents/flashing/IMG_1.jpg"), root),
            PhotoCategory::Flashing
        );
        assert_eq!(
            infer_category(Path::new("/jobs/17/shingles/north/IMG_2.jpg"), root),
            PhotoCategory::Shingles
        );
    }

    #[test]
    fn test_directories_above_root_ignored() {
        let root = Path::new("/damage/jobs");
        assert_eq!(
            infer_category(Path::new("/damage/jobs/IMG_3.jpg"), root),
            PhotoCategory::General
        );
    }

    #[test]
    fn test_root_itself_counts() {
        let root = Path::new("/jobs/gutters");
        assert_eq!(
            infer_category(Path::new("/jobs/gutters/IMG_4.jpg"), root),
            PhotoCategory::Gutters
        );
    }
}
