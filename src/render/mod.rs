//! Encoders that turn document text into output artifacts.

pub mod csv;
mod durable;
mod json;
mod text;

pub use self::csv::{
    csv_rows, split_lines, CsvBackend, CsvEncoder, CsvRow, LibraryCsvBackend, ManualCsvBackend,
    VerifiedCsvWriter,
};
pub use json::{to_json, DocumentInfo, JsonContent, JsonDocument, JsonEncoder, JsonFormat, JsonMetadata};
pub use text::{footer_banner, header_banner, to_text, TextEncoder};

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::StructuredData;

/// Output format of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON document
    Json,
    /// One row per line of text
    Csv,
    /// Annotated plain text
    Txt,
}

impl OutputFormat {
    /// Every supported format.
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Json, OutputFormat::Csv, OutputFormat::Txt];

    /// Tags of every supported format.
    pub fn supported() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.as_str()).collect()
    }

    /// Lowercase tag.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Txt => "txt",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    /// MIME type of the artifact.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Csv => "text/csv",
            OutputFormat::Txt => "text/plain",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "txt" => Ok(OutputFormat::Txt),
            other => Err(Error::UnsupportedFormat(format!(
                "output format {} not supported. Allowed formats: {}",
                other,
                Self::supported().join(", ")
            ))),
        }
    }
}

/// Writes one artifact from document text and its structure.
///
/// Encoders write through a staged file: on error nothing is left at
/// `output`.
pub trait Encoder: Send + Sync {
    /// Format produced by this encoder.
    fn format(&self) -> OutputFormat;

    /// Write the artifact and return its size in bytes.
    fn encode(&self, text: &str, data: &StructuredData, output: &Path) -> Result<u64>;
}
