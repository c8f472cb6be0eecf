//! Extraction options and configuration.

use crate::ocr::RecognitionMode;
use crate::raster::DEFAULT_DPI;

/// Options for extracting text from a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Rendering resolution for paged sources
    pub dpi: u32,

    /// Whether pages are recognized in parallel
    pub parallel: bool,

    /// How the recognizer reads each page
    pub recognition: RecognitionMode,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rendering resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the recognition mode.
    pub fn with_recognition(mut self, recognition: RecognitionMode) -> Self {
        self.recognition = recognition;
        self
    }

    /// Set the recognition language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.recognition = self.recognition.with_language(language);
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            parallel: true,
            recognition: RecognitionMode::default(),
        }
    }
}
