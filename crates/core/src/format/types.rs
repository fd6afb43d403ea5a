//! Types for the format registry.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::registry::{category_of, normalize_extension};

/// Broad media family of a file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    Audio,
    Video,
    Image,
    Document,
    Other,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Image => "image",
            Self::Document => "document",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file format identified by its extension.
///
/// The category is always derived from the extension through the registry,
/// so two formats with the same extension are always equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaFormat {
    extension: String,
    category: MediaCategory,
}

impl MediaFormat {
    /// Creates a format from an extension (case-insensitive, leading dot allowed).
    pub fn new(extension: &str) -> Self {
        let extension = normalize_extension(extension);
        let category = category_of(&extension);
        Self {
            extension,
            category,
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn category(&self) -> MediaCategory {
        self.category
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_format_normalizes_extension() {
        let format = MediaFormat::new(".MP3");
        assert_eq!(format.extension(), "mp3");
        assert_eq!(format.category(), MediaCategory::Audio);
        assert_eq!(format, MediaFormat::new("mp3"));
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&MediaCategory::Document).unwrap();
        assert_eq!(json, "\"document\"");
        assert_eq!(MediaCategory::Video.to_string(), "video");
    }
}
