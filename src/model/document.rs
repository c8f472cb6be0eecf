//! Document-level types.

use crate::detect::detect_kind_from_path;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Literal that opens every page marker.
pub const PAGE_MARKER_PREFIX: &str = "--- Page";

/// Format the marker line for a 1-based page index.
pub fn page_marker(index: u32) -> String {
    format!("{} {} ---", PAGE_MARKER_PREFIX, index)
}

/// Whether a source holds one raster image or a paged document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A single raster image (png, jpg, tiff, bmp)
    SingleImage,
    /// A paged document (pdf)
    MultiPage,
}

/// An input document selected by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    path: PathBuf,
    kind: SourceKind,
}

impl SourceDocument {
    /// Create a source with an explicit kind.
    pub fn new(path: impl Into<PathBuf>, kind: SourceKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Create a source, deriving the kind from the file extension.
    ///
    /// Fails with [`Error::UnsupportedFormat`](crate::Error::UnsupportedFormat)
    /// for extensions outside the supported set.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let kind = detect_kind_from_path(path)?;
        Ok(Self::new(path, kind))
    }

    /// Path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kind of the source.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Whether page markers are emitted for this source.
    pub fn is_multi_page(&self) -> bool {
        self.kind == SourceKind::MultiPage
    }
}

/// The joined text of a whole document.
///
/// Built by the extraction pipeline from the non-blank pages in ascending
/// page order. For multi-page sources every page block is prefixed with a
/// [`page_marker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentText {
    /// The joined text
    pub text: String,

    /// Kind of the source the text came from
    pub kind: SourceKind,

    /// Number of pages produced by rasterization
    pub total_pages: u32,

    /// 1-based indices of pages that contributed text, ascending
    pub pages_with_text: Vec<u32>,
}

impl DocumentText {
    /// Borrow the joined text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Take ownership of the joined text.
    pub fn into_string(self) -> String {
        self.text
    }

    /// Number of pages that were skipped as blank.
    pub fn blank_pages(&self) -> u32 {
        self.total_pages
            .saturating_sub(self.pages_with_text.len() as u32)
    }

    /// Character count (Unicode scalar values).
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl fmt::Display for DocumentText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for DocumentText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_marker() {
        assert_eq!(page_marker(3), "--- Page 3 ---");
        assert!(page_marker(12).starts_with(PAGE_MARKER_PREFIX));
    }

    #[test]
    fn test_source_from_path() {
        let source = SourceDocument::from_path("scans/invoice.pdf").unwrap();
        assert_eq!(source.kind(), SourceKind::MultiPage);
        assert!(source.is_multi_page());
        assert_eq!(source.path(), Path::new("scans/invoice.pdf"));

        let source = SourceDocument::from_path("photo.jpeg").unwrap();
        assert_eq!(source.kind(), SourceKind::SingleImage);

        assert!(SourceDocument::from_path("notes.txt").is_err());
    }

    #[test]
    fn test_document_text_blank_pages() {
        let text = DocumentText {
            text: "--- Page 2 ---\nhello".to_string(),
            kind: SourceKind::MultiPage,
            total_pages: 3,
            pages_with_text: vec![2],
        };
        assert_eq!(text.blank_pages(), 2);
        assert_eq!(text.to_string(), "--- Page 2 ---\nhello");
    }
}
