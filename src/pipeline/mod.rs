//! Extraction pipeline: rasterize a source, recognize each page, and join
//! the page texts in page order.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use unscan::pipeline::ExtractionPipeline;
//! use unscan::{PdftoppmRenderer, SourceDocument, TesseractRecognizer};
//!
//! let pipeline = ExtractionPipeline::new(
//!     Arc::new(PdftoppmRenderer::new()),
//!     Arc::new(TesseractRecognizer::new()),
//! );
//! let source = SourceDocument::from_path("scan.pdf")?;
//! let text = pipeline.process(&source)?;
//! println!("{}", text);
//! # Ok::<(), unscan::Error>(())
//! ```

mod options;

pub use options::ExtractOptions;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::events::{default_sink, EventSink, PipelineEvent};
use crate::model::{page_marker, DocumentText, ExtractedPage, SourceDocument, SourceKind};
use crate::ocr::{Recognizer, TextExtractor};
use crate::raster::{PageRenderer, RasterPage, Rasterizer};

/// Shared flag that stops an in-flight extraction between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether the flag was raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives rasterization and per-page recognition for one source.
pub struct ExtractionPipeline {
    rasterizer: Rasterizer,
    extractor: TextExtractor,
    parallel: bool,
    events: Arc<dyn EventSink>,
}

impl ExtractionPipeline {
    /// Create a pipeline with default [`ExtractOptions`].
    pub fn new(renderer: Arc<dyn PageRenderer>, recognizer: Arc<dyn Recognizer>) -> Self {
        Self::with_options(renderer, recognizer, ExtractOptions::default())
    }

    /// Create a pipeline with custom options.
    pub fn with_options(
        renderer: Arc<dyn PageRenderer>,
        recognizer: Arc<dyn Recognizer>,
        options: ExtractOptions,
    ) -> Self {
        Self {
            rasterizer: Rasterizer::new(renderer).with_dpi(options.dpi),
            extractor: TextExtractor::new(recognizer).with_mode(options.recognition),
            parallel: options.parallel,
            events: default_sink(),
        }
    }

    /// Set the event sink for the pipeline and its components.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.rasterizer = self.rasterizer.with_events(events.clone());
        self.extractor = self.extractor.with_events(events.clone());
        self.events = events;
        self
    }

    /// The rasterizer in use.
    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }

    /// The text extractor in use.
    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    /// Extract the text of `source`.
    ///
    /// # Errors
    /// * [`Error::UnsupportedFormat`] / [`Error::EmptyDocument`] from rasterization
    /// * [`Error::RecognitionFailure`] if any page fails to recognize
    /// * [`Error::NoTextExtracted`] if every page is blank
    pub fn process(&self, source: &SourceDocument) -> Result<DocumentText> {
        self.process_with_cancel(source, &CancelFlag::new())
    }

    /// Extract the text of `source`, checking `cancel` before each page.
    ///
    /// Returns [`Error::Cancelled`] once the flag is raised; pages already
    /// decoded are dropped.
    pub fn process_with_cancel(
        &self,
        source: &SourceDocument,
        cancel: &CancelFlag,
    ) -> Result<DocumentText> {
        let sequence = self.rasterizer.rasterize(source)?;
        let kind = sequence.kind();
        let total = sequence.len() as u32;
        let (pages, _scratch) = sequence.into_parts();

        let mut extracted: Vec<ExtractedPage> = if self.parallel && pages.len() > 1 {
            pages
                .into_par_iter()
                .map(|page| self.extract_page(page, total, cancel))
                .collect::<Result<Vec<_>>>()?
        } else {
            pages
                .into_iter()
                .map(|page| self.extract_page(page, total, cancel))
                .collect::<Result<Vec<_>>>()?
        };

        // Completion order is irrelevant; page order is not.
        extracted.sort_by_key(|page| page.page_index);

        let document = assemble(kind, total, &extracted)?;
        self.events.emit(&PipelineEvent::DocumentAssembled {
            total_pages: document.total_pages,
            pages_with_text: document.pages_with_text.len() as u32,
            chars: document.char_count(),
        });
        Ok(document)
    }

    fn extract_page(
        &self,
        page: RasterPage,
        total: u32,
        cancel: &CancelFlag,
    ) -> Result<ExtractedPage> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let image = page.load()?;
        let extracted = self.extractor.extract(&image)?;
        drop(image);

        self.events.emit(&PipelineEvent::PageExtracted {
            index: extracted.page_index,
            total,
            chars: extracted.text.chars().count(),
            blank: extracted.is_blank,
        });
        Ok(extracted)
    }
}

#[cfg(feature = "async")]
impl ExtractionPipeline {
    /// Run [`process`](Self::process) on tokio's blocking pool.
    ///
    /// Dropping the returned future raises a cancel flag, so the worker
    /// stops before the next page and releases its images.
    pub async fn process_async(self: Arc<Self>, source: SourceDocument) -> Result<DocumentText> {
        let cancel = CancelFlag::new();
        let _guard = CancelOnDrop(cancel.clone());

        tokio::task::spawn_blocking(move || self.process_with_cancel(&source, &cancel))
            .await
            .map_err(|e| Error::Other(format!("extraction task failed: {}", e)))?
    }
}

#[cfg(feature = "async")]
struct CancelOnDrop(CancelFlag);

#[cfg(feature = "async")]
impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Join page texts into a [`DocumentText`].
///
/// `pages` must be sorted by index. Blank pages are skipped. Paged sources
/// get a marker before every page block; a single image yields its text
/// verbatim.
pub fn assemble(kind: SourceKind, total_pages: u32, pages: &[ExtractedPage]) -> Result<DocumentText> {
    let non_blank: Vec<&ExtractedPage> = pages.iter().filter(|p| !p.is_blank).collect();
    if non_blank.is_empty() {
        return Err(Error::NoTextExtracted);
    }

    let text = match kind {
        SourceKind::SingleImage => non_blank
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"),
        SourceKind::MultiPage => non_blank
            .iter()
            .map(|p| format!("{}\n{}", page_marker(p.page_index), p.text))
            .collect::<Vec<_>>()
            .join("\n\n"),
    };

    Ok(DocumentText {
        text,
        kind,
        total_pages,
        pages_with_text: non_blank.iter().map(|p| p.page_index).collect(),
    })
}
