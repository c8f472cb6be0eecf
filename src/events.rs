//! Structured pipeline events and the sinks that receive them.
//!
//! Every component takes an `Arc<dyn EventSink>` instead of logging
//! directly. The default [`LogSink`] forwards events to the `log` facade;
//! [`MemorySink`] records them for inspection.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use unscan::events::{EventSink, MemorySink, PipelineEvent};
//!
//! let sink = Arc::new(MemorySink::new());
//! sink.emit(&PipelineEvent::PagesRasterized { count: 3 });
//! assert_eq!(sink.events().len(), 1);
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::model::SourceKind;
use crate::render::OutputFormat;

/// Something that happened while converting a document.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Rasterization of a source started.
    RasterizeStarted { path: PathBuf, kind: SourceKind },

    /// The source produced this many pages.
    PagesRasterized { count: u32 },

    /// One page went through recognition.
    PageExtracted {
        index: u32,
        total: u32,
        chars: usize,
        blank: bool,
    },

    /// Page texts were joined into the document text.
    DocumentAssembled {
        total_pages: u32,
        pages_with_text: u32,
        chars: usize,
    },

    /// Structuring failed internally and the degenerate structure was used.
    StructureFallback { reason: String },

    /// An encoder started writing an artifact.
    EncodeStarted { format: OutputFormat, path: PathBuf },

    /// The primary CSV backend produced an empty file; rewriting.
    CsvFallback { path: PathBuf },

    /// An artifact was written and verified.
    ArtifactWritten {
        format: OutputFormat,
        path: PathBuf,
        bytes: u64,
    },
}

/// Receiver of pipeline events.
pub trait EventSink: Send + Sync {
    /// Handle one event.
    fn emit(&self, event: &PipelineEvent);
}

/// Forwards events to the `log` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::RasterizeStarted { path, kind } => {
                log::info!("Processing {:?} source: {}", kind, path.display());
            }
            PipelineEvent::PagesRasterized { count } => {
                log::debug!("Rasterized {} page(s)", count);
            }
            PipelineEvent::PageExtracted {
                index,
                total,
                chars,
                blank,
            } => {
                if *blank {
                    log::debug!("Page {} of {} is blank", index, total);
                } else {
                    log::info!("Processed page {} of {} ({} chars)", index, total, chars);
                }
            }
            PipelineEvent::DocumentAssembled {
                total_pages,
                pages_with_text,
                chars,
            } => {
                log::info!(
                    "Assembled {} chars from {} of {} page(s)",
                    chars,
                    pages_with_text,
                    total_pages
                );
            }
            PipelineEvent::StructureFallback { reason } => {
                log::warn!("Text structuring failed, using single-paragraph fallback: {}", reason);
            }
            PipelineEvent::EncodeStarted { format, path } => {
                log::info!("Starting conversion to {} format: {}", format, path.display());
            }
            PipelineEvent::CsvFallback { path } => {
                log::warn!(
                    "CSV appears empty after writer; rewriting as plain string: {}",
                    path.display()
                );
            }
            PipelineEvent::ArtifactWritten {
                format,
                path,
                bytes,
            } => {
                log::info!(
                    "Wrote {} artifact {} ({} bytes)",
                    format,
                    path.display(),
                    bytes
                );
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// Records events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemorySink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<PipelineEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &PipelineEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

/// The sink used when none is injected.
pub fn default_sink() -> Arc<dyn EventSink> {
    Arc::new(LogSink)
}
