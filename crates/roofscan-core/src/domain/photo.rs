//! Photo inputs submitted for analysis.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// The roof component a photo was taken of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoCategory {
    /// Overview shot of the whole roof.
    #[default]
    General,
    /// Close-up of the shingle field.
    Shingles,
    /// Metal flashing at transitions and penetrations.
    Flashing,
    /// Gutter runs and downspouts.
    Gutters,
    /// Roof vents and other penetrations.
    Vents,
    /// Chimney stack, crown and cap.
    Chimney,
    /// Photo the inspector flagged as showing damage.
    Damage,
}

impl PhotoCategory {
    /// All categories in declaration order.
    pub const ALL: [Self; 7] = [
        Self::General,
        Self::Shingles,
        Self::Flashing,
        Self::Gutters,
        Self::Vents,
        Self::Chimney,
        Self::Damage,
    ];

    /// Returns the lowercase identifier used in config files and directory names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Shingles => "shingles",
            Self::Flashing => "flashing",
            Self::Gutters => "gutters",
            Self::Vents => "vents",
            Self::Chimney => "chimney",
            Self::Damage => "damage",
        }
    }

    /// Parses a category name, accepting a few common singular forms.
    ///
    /// Returns `None` for names that do not identify a category.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "general" | "overview" => Some(Self::General),
            "shingles" | "shingle" => Some(Self::Shingles),
            "flashing" => Some(Self::Flashing),
            "gutters" | "gutter" => Some(Self::Gutters),
            "vents" | "vent" => Some(Self::Vents),
            "chimney" | "chimneys" => Some(Self::Chimney),
            "damage" => Some(Self::Damage),
            _ => None,
        }
    }
}

impl fmt::Display for PhotoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoCategory {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to `General`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s).unwrap_or_default())
    }
}

/// Where the raw photo bytes come from.
#[derive(Debug, Clone)]
pub enum PhotoData {
    /// Encoded image bytes already in memory.
    Bytes(Vec<u8>),
    /// Encoded image file on disk.
    File(PathBuf),
}

/// A categorized photo submitted for analysis.
#[derive(Debug, Clone)]
pub struct PhotoInput {
    /// Human-readable label (usually the file path).
    pub label: String,
    /// Declared roof component.
    pub category: PhotoCategory,
    /// Encoded image data.
    pub data: PhotoData,
}

impl PhotoInput {
    /// Creates a photo input from in-memory encoded bytes.
    #[must_use]
    pub fn from_bytes(label: impl Into<String>, category: PhotoCategory, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            category,
            data: PhotoData::Bytes(bytes),
        }
    }

    /// Creates a photo input backed by a file on disk.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>, category: PhotoCategory) -> Self {
        let path = path.as_ref();
        Self {
            label: path.to_string_lossy().into_owned(),
            category,
            data: PhotoData::File(path.to_path_buf()),
        }
    }

    /// Decodes the photo into a bitmap.
    ///
    /// # Errors
    ///
    /// Returns `PhotoRead` if the file cannot be opened and `ImageDecode` if the
    /// bytes are not a supported raster format.
    pub fn decode(&self) -> Result<image::DynamicImage, AnalysisError> {
        match &self.data {
            PhotoData::Bytes(bytes) => Ok(image::load_from_memory(bytes)?),
            PhotoData::File(path) => {
                let reader = image::ImageReader::open(path)
                    .and_then(image::ImageReader::with_guessed_format)
                    .map_err(|source| AnalysisError::PhotoRead {
                        path: path.clone(),
                        source,
                    })?;
                Ok(reader.decode()?)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip() {
        for category in PhotoCategory::ALL {
            assert_eq!(PhotoCategory::from_name(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!(PhotoCategory::from_name("Gutter"), Some(PhotoCategory::Gutters));
        assert_eq!(PhotoCategory::from_name(" VENT "), Some(PhotoCategory::Vents));
        assert_eq!(PhotoCategory::from_name("attic"), None);
    }

    #[test]
    fn test_unknown_category_parses_as_general() {
        let parsed: PhotoCategory = "skylight".parse().expect("infallible");
        assert_eq!(parsed, PhotoCategory::General);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&PhotoCategory::Chimney).expect("serialize");
        assert_eq!(json, "\"chimney\"");
    }

    #[test]
    fn test_decode_corrupt_bytes_fails() {
        let photo = PhotoInput::from_bytes("junk", PhotoCategory::General, vec![0, 1, 2, 3]);
        let err = photo.decode().expect_err("garbage should not decode");
        assert!(matches!(err, AnalysisError::ImageDecode(_)));
    }

    #[test]
    fn test_decode_missing_file_fails() {
        let photo = PhotoInput::from_path("/nonexistent/roof.jpg", PhotoCategory::Shingles);
        let err = photo.decode().expect_err("missing file should not decode");
        assert!(matches!(err, AnalysisError::PhotoRead { .. }));
        assert_eq!(photo.label, "/nonexistent/roof.jpg");
    }
}
