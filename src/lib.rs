//! # unscan
//!
//! OCR conversion of scanned documents for Rust.
//!
//! This library rasterizes scanned PDFs and images, recognizes the text of
//! every page, and writes the result as structured JSON, line-oriented CSV,
//! or annotated plain text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unscan::{OutputFormat, Unscan};
//!
//! fn main() -> unscan::Result<()> {
//!     // Extract the text of a scanned PDF
//!     let text = Unscan::new().extract("scan.pdf")?;
//!     println!("{}", text);
//!
//!     // Convert it to JSON
//!     let report = Unscan::new().convert("scan.pdf", OutputFormat::Json, "scan.json")?;
//!     println!("{} bytes written", report.bytes_written);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Three output formats**: JSON, CSV (one row per line), annotated TXT
//! - **Page ordering**: Blank pages skipped, page markers in ascending order
//! - **Durable artifacts**: Staged, synced, verified, then renamed into place
//! - **Parallel processing**: Uses Rayon for multi-page documents
//! - **Pluggable backends**: `Recognizer` and `PageRenderer` traits

pub mod detect;
pub mod error;
pub mod events;
pub mod model;
pub mod ocr;
pub mod pipeline;
pub mod raster;
pub mod render;
pub mod structure;

// Re-export commonly used types
pub use detect::{detect_kind_from_path, is_pdf_bytes, SUPPORTED_EXTENSIONS};
pub use error::{Error, ErrorCategory, Result};
pub use events::{EventSink, LogSink, MemorySink, NullSink, PipelineEvent};
pub use model::{DocumentText, ExtractedPage, PageImage, SourceDocument, SourceKind, StructuredData};
pub use ocr::{EngineMode, RecognitionMode, Recognizer, SegmentationMode, TesseractRecognizer};
#[cfg(feature = "ocrs")]
pub use ocr::{OcrsConfig, OcrsRecognizer};
pub use pipeline::{CancelFlag, ExtractOptions, ExtractionPipeline};
pub use raster::{PageRenderer, PdftoppmRenderer, RenderedPage};
pub use render::{CsvEncoder, Encoder, JsonEncoder, JsonFormat, OutputFormat, TextEncoder};
pub use structure::{StructureOptions, TextStructurer};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::default_sink;

/// Extract the text of a scanned document with the default backends.
///
/// # Example
///
/// ```no_run
/// use unscan::extract_text;
///
/// let text = extract_text("scan.png").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(Unscan::new().extract(path)?.into_string())
}

/// Convert a scanned document to `format` at `output` with the default backends.
///
/// # Example
///
/// ```no_run
/// use unscan::{convert_file, OutputFormat};
///
/// convert_file("scan.pdf", OutputFormat::Csv, "out/scan.csv").unwrap();
/// ```
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    format: OutputFormat,
    output: Q,
) -> Result<ConversionReport> {
    Unscan::new().convert(input, format, output)
}

/// Default artifact path for `input`: same directory and stem, format extension.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    input.with_extension(format.extension())
}

/// Builder for extracting and converting scanned documents.
///
/// # Example
///
/// ```no_run
/// use unscan::{JsonFormat, OutputFormat, Unscan};
///
/// let report = Unscan::new()
///     .with_dpi(200)
///     .with_language("deu")
///     .with_json_format(JsonFormat::Compact)
///     .sequential()
///     .convert("scan.pdf", OutputFormat::Json, "scan.json")?;
/// # Ok::<(), unscan::Error>(())
/// ```
pub struct Unscan {
    renderer: Arc<dyn PageRenderer>,
    recognizer: Arc<dyn Recognizer>,
    extract_options: ExtractOptions,
    structure_options: StructureOptions,
    json_format: JsonFormat,
    text_companion: bool,
    events: Arc<dyn EventSink>,
}

impl Unscan {
    /// Create a builder backed by `pdftoppm` and `tesseract`.
    pub fn new() -> Self {
        Self {
            renderer: Arc::new(PdftoppmRenderer::new()),
            recognizer: Arc::new(TesseractRecognizer::new()),
            extract_options: ExtractOptions::default(),
            structure_options: StructureOptions::default(),
            json_format: JsonFormat::default(),
            text_companion: false,
            events: default_sink(),
        }
    }

    /// Use a different recognizer.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    /// Use a different page renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Set extraction options.
    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract_options = options;
        self
    }

    /// Set rendering resolution for paged sources.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.extract_options = self.extract_options.with_dpi(dpi);
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.extract_options = self.extract_options.sequential();
        self
    }

    /// Set the recognition language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.extract_options = self.extract_options.with_language(language);
        self
    }

    /// Set the recognition mode.
    pub fn with_recognition(mut self, recognition: RecognitionMode) -> Self {
        self.extract_options = self.extract_options.with_recognition(recognition);
        self
    }

    /// Set structuring options.
    pub fn with_structure_options(mut self, options: StructureOptions) -> Self {
        self.structure_options = options;
        self
    }

    /// Set JSON output style.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Also write the raw text next to CSV artifacts.
    pub fn with_text_companion(mut self, enabled: bool) -> Self {
        self.text_companion = enabled;
        self
    }

    /// Set the event sink for every stage.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Current extraction options.
    pub fn extract_options(&self) -> &ExtractOptions {
        &self.extract_options
    }

    /// Build the extraction pipeline for the current settings.
    pub fn pipeline(&self) -> ExtractionPipeline {
        ExtractionPipeline::with_options(
            self.renderer.clone(),
            self.recognizer.clone(),
            self.extract_options.clone(),
        )
        .with_events(self.events.clone())
    }

    /// Build the structurer for the current settings.
    pub fn structurer(&self) -> TextStructurer {
        TextStructurer::with_options(self.structure_options.clone()).with_events(self.events.clone())
    }

    /// Build the encoder for `format` with the current settings.
    pub fn encoder(&self, format: OutputFormat) -> Box<dyn Encoder> {
        match format {
            OutputFormat::Json => Box::new(
                JsonEncoder::new()
                    .with_format(self.json_format)
                    .with_events(self.events.clone()),
            ),
            OutputFormat::Csv => Box::new(
                CsvEncoder::new()
                    .with_text_companion(self.text_companion)
                    .with_events(self.events.clone()),
            ),
            OutputFormat::Txt => Box::new(TextEncoder::new().with_events(self.events.clone())),
        }
    }

    /// Extract the text of the document at `path`.
    ///
    /// # Errors
    /// * [`Error::UnsupportedFormat`] for unsupported input extensions
    /// * [`Error::NoTextExtracted`] if no page yields text
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<DocumentText> {
        let source = SourceDocument::from_path(path)?;
        self.pipeline().process(&source)
    }

    /// Extract and structure the document at `path`.
    ///
    /// The page count of the structure is the number of rasterized pages.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<(DocumentText, StructuredData)> {
        let document = self.extract(path)?;
        let data = self
            .structurer()
            .structure(document.as_str())
            .with_page_count(document.total_pages);
        Ok((document, data))
    }

    /// Convert the document at `input` into a `format` artifact at `output`.
    ///
    /// Both the input extension and the format are validated before any
    /// work starts. Nothing is left at `output` on failure.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        format: OutputFormat,
        output: Q,
    ) -> Result<ConversionReport> {
        let input = input.as_ref();
        let output = output.as_ref();
        let started_at = Utc::now();

        let (document, data) = self.analyze(input)?;
        let bytes_written = self.encoder(format).encode(document.as_str(), &data, output)?;

        Ok(ConversionReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            format,
            total_pages: document.total_pages,
            pages_with_text: document.pages_with_text.len() as u32,
            characters: document.char_count(),
            bytes_written,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Convert using a format tag such as `"json"`.
    ///
    /// Unknown tags fail with [`Error::UnsupportedFormat`].
    pub fn convert_tagged<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        format: &str,
        output: Q,
    ) -> Result<ConversionReport> {
        let format: OutputFormat = format.parse()?;
        self.convert(input, format, output)
    }
}

impl Default for Unscan {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of one completed conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Source document path
    pub input: PathBuf,
    /// Artifact path
    pub output: PathBuf,
    /// Artifact format
    pub format: OutputFormat,
    /// Pages rasterized
    pub total_pages: u32,
    /// Pages that yielded text
    pub pages_with_text: u32,
    /// Characters of extracted text
    pub characters: usize,
    /// Artifact size in bytes
    pub bytes_written: u64,
    /// When the conversion started
    pub started_at: DateTime<Utc>,
    /// When the artifact was committed
    pub finished_at: DateTime<Utc>,
}

impl ConversionReport {
    /// Wall-clock duration of the conversion.
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
