//! Text recognition for rasterized pages.
//!
//! The OCR engine is a [`Recognizer`] capability; [`TextExtractor`] wraps it
//! and normalizes whatever text comes back.

#[cfg(feature = "ocrs")]
mod ocrs_engine;
mod tesseract;

#[cfg(feature = "ocrs")]
pub use ocrs_engine::{OcrsConfig, OcrsRecognizer};
pub use tesseract::TesseractRecognizer;

use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::events::{default_sink, EventSink};
use crate::model::{ExtractedPage, PageImage};

/// OCR engine selection (tesseract `--oem`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngineMode {
    /// Legacy engine only
    Legacy,
    /// Neural nets LSTM engine only
    Lstm,
    /// Legacy and LSTM combined
    Combined,
    /// Best available engine
    #[default]
    Default,
}

impl EngineMode {
    /// Numeric `--oem` value.
    pub fn as_oem(self) -> u8 {
        match self {
            EngineMode::Legacy => 0,
            EngineMode::Lstm => 1,
            EngineMode::Combined => 2,
            EngineMode::Default => 3,
        }
    }
}

/// Page segmentation (tesseract `--psm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SegmentationMode {
    /// Fully automatic segmentation
    Auto,
    /// Assume a single column of text of variable sizes
    SingleColumn,
    /// Assume a single uniform block of text
    #[default]
    UniformBlock,
    /// Find as much text as possible in no particular order
    SparseText,
}

impl SegmentationMode {
    /// Numeric `--psm` value.
    pub fn as_psm(self) -> u8 {
        match self {
            SegmentationMode::Auto => 3,
            SegmentationMode::SingleColumn => 4,
            SegmentationMode::UniformBlock => 6,
            SegmentationMode::SparseText => 11,
        }
    }
}

/// How the recognizer should read a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionMode {
    /// Engine selection
    pub engine: EngineMode,

    /// Segmentation strategy
    pub segmentation: SegmentationMode,

    /// Language pack code (e.g., "eng", "deu+eng")
    pub language: String,
}

impl RecognitionMode {
    /// Create the default mode: best engine, uniform block, English.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine.
    pub fn with_engine(mut self, engine: EngineMode) -> Self {
        self.engine = engine;
        self
    }

    /// Set the segmentation strategy.
    pub fn with_segmentation(mut self, segmentation: SegmentationMode) -> Self {
        self.segmentation = segmentation;
        self
    }

    /// Set the language pack.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Default for RecognitionMode {
    fn default() -> Self {
        Self {
            engine: EngineMode::Default,
            segmentation: SegmentationMode::UniformBlock,
            language: "eng".to_string(),
        }
    }
}

/// Capability that reads raw text from one image.
///
/// Returning an empty string means nothing was recognized; errors are
/// reserved for failures of the engine itself.
pub trait Recognizer: Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &str;

    /// Recognize the text in `image`.
    fn recognize(&self, image: &DynamicImage, mode: &RecognitionMode) -> Result<String>;

    /// Report backend availability, returning a version or description.
    fn probe(&self) -> Result<String> {
        Ok(self.name().to_string())
    }
}

/// Turns page images into cleaned page text.
pub struct TextExtractor {
    recognizer: Arc<dyn Recognizer>,
    mode: RecognitionMode,
    events: Arc<dyn EventSink>,
}

impl TextExtractor {
    /// Create an extractor with the default [`RecognitionMode`].
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            recognizer,
            mode: RecognitionMode::default(),
            events: default_sink(),
        }
    }

    /// Set the recognition mode.
    pub fn with_mode(mut self, mode: RecognitionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the event sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// The recognition mode in use.
    pub fn mode(&self) -> &RecognitionMode {
        &self.mode
    }

    /// The recognizer backing this extractor.
    pub fn recognizer(&self) -> &Arc<dyn Recognizer> {
        &self.recognizer
    }

    /// Recognize and normalize one page.
    ///
    /// # Errors
    /// [`Error::RecognitionFailure`] if the recognizer fails.
    pub fn extract(&self, page: &PageImage) -> Result<ExtractedPage> {
        let raw = self
            .recognizer
            .recognize(&page.image, &self.mode)
            .map_err(|e| match e {
                Error::RecognitionFailure(_) => e,
                other => Error::RecognitionFailure(format!(
                    "{} failed on page {}: {}",
                    self.recognizer.name(),
                    page.index,
                    other
                )),
            })?;

        Ok(ExtractedPage::new(page.index, clean_text(&raw)))
    }
}

/// Normalize raw OCR output.
///
/// Trims every line, drops lines that end up empty, rejoins with single
/// newlines and collapses any run of three or more newlines to two.
pub fn clean_text(raw: &str) -> String {
    let joined = raw
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    collapse_newlines(&joined)
}

fn collapse_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0;
    for ch in text.chars() {
        if ch == '\n' {
            run += 1;
            if run > 2 {
                continue;
            }
        } else {
            run = 0;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;

    struct EchoRecognizer(&'static str);

    impl Recognizer for EchoRecognizer {
        fn name(&self) -> &str {
            "echo"
        }

        fn recognize(&self, _image: &DynamicImage, _mode: &RecognitionMode) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenRecognizer;

    impl Recognizer for BrokenRecognizer {
        fn name(&self) -> &str {
            "broken"
        }

        fn recognize(&self, _image: &DynamicImage, _mode: &RecognitionMode) -> Result<String> {
            Err(Error::Other("corrupt image data".to_string()))
        }
    }

    fn page() -> PageImage {
        PageImage::new(4, DynamicImage::new_rgb8(4, 4))
    }

    #[test]
    fn test_clean_text_trims_and_drops_empty_lines() {
        let raw = "  Hello world  \n\n\n   \nSecond line\r\n\tThird\t\n";
        assert_eq!(clean_text(raw), "Hello world\nSecond line\nThird");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n \n\t"), "");
    }

    #[test]
    fn test_collapse_newlines() {
        assert_eq!(collapse_newlines("a\n\n\n\nb\nc"), "a\n\nb\nc");
        assert_eq!(collapse_newlines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_extract_blank_page_is_not_an_error() {
        let extractor =
            TextExtractor::new(Arc::new(EchoRecognizer("  \n\n "))).with_events(Arc::new(NullSink));
        let extracted = extractor.extract(&page()).unwrap();
        assert_eq!(extracted.page_index, 4);
        assert!(extracted.is_blank);
        assert_eq!(extracted.text, "");
    }

    #[test]
    fn test_extract_normalizes() {
        let extractor = TextExtractor::new(Arc::new(EchoRecognizer(" Invoice \n\n Total: 5 ")));
        let extracted = extractor.extract(&page()).unwrap();
        assert_eq!(extracted.text, "Invoice\nTotal: 5");
        assert!(!extracted.is_blank);
    }

    #[test]
    fn test_extract_wraps_failures() {
        let extractor = TextExtractor::new(Arc::new(BrokenRecognizer));
        let result = extractor.extract(&page());
        match result {
            Err(Error::RecognitionFailure(msg)) => {
                assert!(msg.contains("page 4"));
                assert!(msg.contains("corrupt image data"));
            }
            other => panic!("expected recognition failure, got {:?}", other),
        }
    }

    #[test]
    fn test_default_mode() {
        let mode = RecognitionMode::default();
        assert_eq!(mode.engine.as_oem(), 3);
        assert_eq!(mode.segmentation.as_psm(), 6);
        assert_eq!(mode.language, "eng");

        let mode = RecognitionMode::new()
            .with_segmentation(SegmentationMode::Auto)
            .with_language("deu");
        assert_eq!(mode.segmentation.as_psm(), 3);
        assert_eq!(mode.language, "deu");
    }
}
