//! JSON encoding of extracted documents.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::durable::write_artifact;
use super::{Encoder, OutputFormat};
use crate::error::{Error, Result};
use crate::events::{default_sink, EventSink, PipelineEvent};
use crate::model::StructuredData;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Top-level JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonDocument {
    pub document_info: DocumentInfo,
    pub content: JsonContent,
    pub metadata: JsonMetadata,
}

/// Document counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub total_pages: u32,
    pub total_paragraphs: usize,
    /// Whitespace-separated tokens of the raw text
    pub total_words: usize,
    /// Unicode scalar values in the raw text
    pub total_characters: usize,
}

/// Text and its decomposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonContent {
    pub full_text: String,
    pub paragraphs: Vec<String>,
    pub sentences: Vec<String>,
    pub words: Vec<String>,
}

/// Provenance tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonMetadata {
    pub extraction_method: String,
    pub format: String,
}

impl JsonDocument {
    /// Assemble the JSON document for `text` and its structure.
    pub fn new(text: &str, data: &StructuredData) -> Self {
        Self {
            document_info: DocumentInfo {
                total_pages: data.page_count,
                total_paragraphs: data.paragraphs.len(),
                total_words: text.split_whitespace().count(),
                total_characters: text.chars().count(),
            },
            content: JsonContent {
                full_text: text.to_string(),
                paragraphs: data.paragraphs.clone(),
                sentences: data.sentences.clone(),
                words: data.words.clone(),
            },
            metadata: JsonMetadata {
                extraction_method: "OCR".to_string(),
                format: OutputFormat::Json.to_string(),
            },
        }
    }
}

/// Serialize `text` and its structure to a JSON string.
pub fn to_json(text: &str, data: &StructuredData, format: JsonFormat) -> Result<String> {
    let doc = JsonDocument::new(text, data);
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&doc),
        JsonFormat::Compact => serde_json::to_string(&doc),
    };

    result.map_err(|e| Error::EncodingFailure(format!("JSON serialization error: {}", e)))
}

/// Writes [`JsonDocument`] artifacts.
pub struct JsonEncoder {
    format: JsonFormat,
    events: Arc<dyn EventSink>,
}

impl JsonEncoder {
    /// Create a pretty-printing encoder.
    pub fn new() -> Self {
        Self {
            format: JsonFormat::Pretty,
            events: default_sink(),
        }
    }

    /// Set the JSON layout.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the event sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for JsonEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn encode(&self, text: &str, data: &StructuredData, output: &Path) -> Result<u64> {
        self.events.emit(&PipelineEvent::EncodeStarted {
            format: OutputFormat::Json,
            path: output.to_path_buf(),
        });

        let json = to_json(text, data, self.format)?;
        let bytes = write_artifact(output, json.as_bytes())?;

        self.events.emit(&PipelineEvent::ArtifactWritten {
            format: OutputFormat::Json,
            path: output.to_path_buf(),
            bytes,
        });
        Ok(bytes)
    }
}
