//! Decomposition of document text into paragraphs, sentences, and words.
//!
//! Structuring never fails: if parsing hits an internal fault the
//! structurer falls back to [`StructuredData::degenerate`] so every
//! extraction still yields something the encoders can write.
//!
//! # Example
//!
//! ```
//! use unscan::structure::structure;
//!
//! let data = structure("Hello world. Foo bar!\n\nNext para? Yes.");
//! assert_eq!(data.paragraphs, vec!["Hello world. Foo bar!", "Next para? Yes."]);
//! assert_eq!(data.sentences, vec!["Hello world", "Foo bar", "Next para", "Yes"]);
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use regex::Regex;

use crate::events::{default_sink, EventSink, PipelineEvent};
use crate::model::{StructuredData, PAGE_MARKER_PREFIX};

/// Default sentence boundary: any run of terminal punctuation.
pub const DEFAULT_SENTENCE_PATTERN: &str = r"[.!?]+";

/// Options for text structuring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureOptions {
    /// Regular expression matching sentence boundaries
    pub sentence_pattern: String,
}

impl StructureOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sentence boundary pattern.
    pub fn with_sentence_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.sentence_pattern = pattern.into();
        self
    }
}

impl Default for StructureOptions {
    fn default() -> Self {
        Self {
            sentence_pattern: DEFAULT_SENTENCE_PATTERN.to_string(),
        }
    }
}

/// Splits document text into [`StructuredData`].
pub struct TextStructurer {
    sentence_boundary: Result<Regex, regex::Error>,
    events: Arc<dyn EventSink>,
}

impl TextStructurer {
    /// Create a structurer with default options.
    pub fn new() -> Self {
        Self::with_options(StructureOptions::default())
    }

    /// Create a structurer with custom options.
    ///
    /// An invalid sentence pattern is not reported here; it makes every
    /// [`structure`](Self::structure) call take the fallback path.
    pub fn with_options(options: StructureOptions) -> Self {
        Self {
            sentence_boundary: Regex::new(&options.sentence_pattern),
            events: default_sink(),
        }
    }

    /// Set the event sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Structure `text`, falling back to the degenerate structure on any
    /// internal fault.
    pub fn structure(&self, text: &str) -> StructuredData {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_structure(text)));
        let reason = match outcome {
            Ok(Ok(data)) => return data,
            Ok(Err(reason)) => reason,
            Err(payload) => panic_message(payload.as_ref()),
        };

        self.events
            .emit(&PipelineEvent::StructureFallback { reason });
        StructuredData::degenerate(text)
    }

    fn try_structure(&self, text: &str) -> Result<StructuredData, String> {
        let boundary = self
            .sentence_boundary
            .as_ref()
            .map_err(|e| format!("invalid sentence pattern: {}", e))?;

        let normalized = normalize_line_endings(text);

        let paragraphs: Vec<String> = normalized
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        let sentences: Vec<String> = paragraphs
            .iter()
            .flat_map(|p| boundary.split(p))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let words = text.split_whitespace().map(str::to_string).collect();

        Ok(StructuredData {
            page_count: lexical_page_count(&normalized),
            paragraphs,
            sentences,
            words,
        })
    }
}

impl Default for TextStructurer {
    fn default() -> Self {
        Self::new()
    }
}

/// Structure `text` with default options.
pub fn structure(text: &str) -> StructuredData {
    TextStructurer::new().structure(text)
}

/// Replace CRLF, then any remaining CR, with LF.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Page count inferred from page markers.
///
/// Counts occurrences of the marker prefix and adds one; text without
/// markers counts as a single page. This does not account for blank pages
/// the extractor skipped.
pub fn lexical_page_count(text: &str) -> u32 {
    let markers = text.matches(PAGE_MARKER_PREFIX).count() as u32;
    if markers > 0 {
        markers + 1
    } else {
        1
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during structuring".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;

    #[test]
    fn test_paragraphs_and_sentences() {
        let data = structure("Hello world. Foo bar!\n\nNext para? Yes.");
        assert_eq!(
            data.paragraphs,
            vec!["Hello world. Foo bar!", "Next para? Yes."]
        );
        assert_eq!(data.sentences, vec!["Hello world", "Foo bar", "Next para", "Yes"]);
        assert_eq!(
            data.words,
            vec!["Hello", "world.", "Foo", "bar!", "Next", "para?", "Yes."]
        );
        assert_eq!(data.page_count, 1);
    }

    #[test]
    fn test_line_endings_are_normalized() {
        let crlf = structure("One.\r\n\r\nTwo.");
        let cr = structure("One.\r\rTwo.");
        let lf = structure("One.\n\nTwo.");
        assert_eq!(crlf.paragraphs, vec!["One.", "Two."]);
        assert_eq!(crlf.paragraphs, lf.paragraphs);
        assert_eq!(cr.paragraphs, lf.paragraphs);
    }

    #[test]
    fn test_terminator_runs_count_once() {
        let data = structure("Wait... What?! Really");
        assert_eq!(data.sentences, vec!["Wait", "What", "Really"]);
    }

    #[test]
    fn test_blank_blocks_are_dropped() {
        let data = structure("\n\n  \n\nA\n\n\n\nB\n\n");
        assert_eq!(data.paragraphs, vec!["A", "B"]);
        assert_eq!(data.sentences, vec!["A", "B"]);
    }

    #[test]
    fn test_empty_text() {
        let data = structure("");
        assert!(data.paragraphs.is_empty());
        assert!(data.sentences.is_empty());
        assert!(data.words.is_empty());
        assert_eq!(data.page_count, 1);
    }

    #[test]
    fn test_lexical_page_count() {
        assert_eq!(lexical_page_count("no markers"), 1);
        assert_eq!(lexical_page_count("--- Page 1 ---\na"), 2);
        assert_eq!(
            lexical_page_count("--- Page 1 ---\na\n\n--- Page 3 ---\nb"),
            3
        );
    }

    #[test]
    fn test_invalid_pattern_falls_back() {
        let sink = Arc::new(MemorySink::new());
        let structurer =
            TextStructurer::with_options(StructureOptions::new().with_sentence_pattern("[unclosed"))
                .with_events(sink.clone());

        let text = "--- Page 1 ---\nFirst. Second!\n\nThird";
        let data = structurer.structure(text);

        assert_eq!(data, StructuredData::degenerate(text));
        assert_eq!(data.page_count, 1);
        assert_eq!(data.paragraphs, vec![text]);
        assert_eq!(data.sentences, vec![text]);
        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e, PipelineEvent::StructureFallback { .. })));
    }

    #[test]
    fn test_paragraph_partition_is_stable() {
        let data = structure("Alpha one.\n\n  Beta two!  \n\n\n\nGamma");
        let rejoined = data.paragraphs.join("\n\n");
        let again = structure(&rejoined);
        assert_eq!(again.paragraphs, data.paragraphs);
        assert_eq!(again.sentences, data.sentences);
    }
}
