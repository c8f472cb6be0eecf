//! Annotated plain text encoding.

use std::path::Path;
use std::sync::Arc;

use super::durable::write_artifact;
use super::{Encoder, OutputFormat};
use crate::error::Result;
use crate::events::{default_sink, EventSink, PipelineEvent};
use crate::model::StructuredData;

const BANNER_WIDTH: usize = 50;

/// Title line of the header banner.
pub const HEADER_TITLE: &str = "EXTRACTED DOCUMENT TEXT";

/// Title line of the content separator.
pub const CONTENT_TITLE: &str = "DOCUMENT CONTENT";

/// Title line of the footer banner.
pub const FOOTER_TITLE: &str = "End of Document";

/// The full header banner, three lines.
pub fn header_banner() -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("{rule}\n{HEADER_TITLE}\n{rule}\n")
}

/// The full footer banner, three lines.
pub fn footer_banner() -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("{rule}\n{FOOTER_TITLE}\n{rule}\n")
}

/// Render the annotated document: header, statistics, verbatim text, footer.
///
/// Statistics are computed from the raw text. Paragraphs here are blocks
/// separated by a blank line.
pub fn to_text(text: &str) -> String {
    let words = text.split_whitespace().count();
    let paragraphs = text.split("\n\n").filter(|p| !p.trim().is_empty()).count();
    let characters = text.chars().count();
    let separator = "-".repeat(BANNER_WIDTH);

    let mut out = String::with_capacity(text.len() + 512);
    out.push_str(&header_banner());
    out.push('\n');
    out.push_str("Document Statistics:\n");
    out.push_str(&format!("- Total Words: {}\n", words));
    out.push_str(&format!("- Total Paragraphs: {}\n", paragraphs));
    out.push_str(&format!("- Total Characters: {}\n", characters));
    out.push('\n');
    out.push_str(&format!("{separator}\n{CONTENT_TITLE}\n{separator}\n\n"));
    out.push_str(text);
    out.push_str("\n\n");
    out.push_str(&footer_banner());
    out
}

/// Writes annotated plain text artifacts.
pub struct TextEncoder {
    events: Arc<dyn EventSink>,
}

impl TextEncoder {
    /// Create a text encoder.
    pub fn new() -> Self {
        Self {
            events: default_sink(),
        }
    }

    /// Set the event sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }
}

impl Default for TextEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for TextEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Txt
    }

    fn encode(&self, text: &str, _data: &StructuredData, output: &Path) -> Result<u64> {
        self.events.emit(&PipelineEvent::EncodeStarted {
            format: OutputFormat::Txt,
            path: output.to_path_buf(),
        });

        let bytes = write_artifact(output, to_text(text).as_bytes())?;

        self.events.emit(&PipelineEvent::ArtifactWritten {
            format: OutputFormat::Txt,
            path: output.to_path_buf(),
            bytes,
        });
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text_layout() {
        let out = to_text("Hello world.\n\nSecond.");
        let expected = format!(
            "{}\n{}\n{}\n\nDocument Statistics:\n- Total Words: 3\n- Total Paragraphs: 2\n- Total Characters: 21\n\n{}\n{}\n{}\n\nHello world.\n\nSecond.\n\n{}\n{}\n{}\n",
            "=".repeat(50),
            HEADER_TITLE,
            "=".repeat(50),
            "-".repeat(50),
            CONTENT_TITLE,
            "-".repeat(50),
            "=".repeat(50),
            FOOTER_TITLE,
            "=".repeat(50),
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_banners() {
        let out = to_text("");
        assert!(out.starts_with(&header_banner()));
        assert!(out.ends_with(&footer_banner()));
        assert!(out.contains("- Total Words: 0\n"));
    }

    #[test]
    fn test_no_truncation() {
        let big = "word ".repeat(200_000);
        let out = to_text(&big);
        assert!(out.contains(&big));
        assert!(out.contains("- Total Words: 200000\n"));
    }
}
