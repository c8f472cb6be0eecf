//! Error types for unscan library.

use std::io;
use thiserror::Error;

/// Result type alias for unscan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting or encoding a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input extension or requested output format is not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A multi-page source produced no pages.
    #[error("Document has no pages")]
    EmptyDocument,

    /// Every page was blank after recognition.
    #[error("No text could be extracted: the document contains no readable text")]
    NoTextExtracted,

    /// The recognition capability itself failed.
    #[error("Recognition failed: {0}")]
    RecognitionFailure(String),

    /// The page renderer failed to rasterize the source.
    #[error("Rasterization failed: {0}")]
    Rasterization(String),

    /// Writing or verifying an output artifact failed.
    #[error("Encoding failed: {0}")]
    EncodingFailure(String),

    /// The request was cancelled before extraction finished.
    #[error("Extraction cancelled")]
    Cancelled,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Coarse classification used by callers to decide how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input from the caller (file type, format tag).
    Caller,
    /// The document itself has nothing to extract.
    Content,
    /// The OCR or rasterization backend failed.
    Recognition,
    /// Output could not be written.
    Encoding,
    /// Anything else.
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnsupportedFormat(_) => ErrorCategory::Caller,
            Error::EmptyDocument | Error::NoTextExtracted => ErrorCategory::Content,
            Error::RecognitionFailure(_) | Error::Rasterization(_) => ErrorCategory::Recognition,
            Error::EncodingFailure(_) => ErrorCategory::Encoding,
            Error::Io(_) | Error::Cancelled | Error::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the user can fix this by supplying a different document or option.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Caller | ErrorCategory::Content
        )
    }

    pub(crate) fn encoding(context: &str, err: impl std::fmt::Display) -> Self {
        Error::EncodingFailure(format!("{}: {}", context, err))
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            image::ImageError::Unsupported(e) => Error::UnsupportedFormat(e.to_string()),
            _ => Error::RecognitionFailure(format!("Image decoding error: {}", err)),
        }
    }
}
