//! Data model shared by the extraction pipeline and the encoders.
//!
//! Sources and page images live only for one conversion; the document text
//! and its structured view are held just long enough to encode an artifact.

mod document;
mod page;
mod structured;

pub use document::{page_marker, DocumentText, SourceDocument, SourceKind, PAGE_MARKER_PREFIX};
pub use page::{ExtractedPage, PageImage};
pub use structured::StructuredData;
