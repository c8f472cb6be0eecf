//! Paragraph, sentence, and word decomposition of a document.

use serde::{Deserialize, Serialize};

/// Structured view of a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredData {
    /// Number of pages (at least 1)
    pub page_count: u32,

    /// Non-empty paragraphs in source order
    pub paragraphs: Vec<String>,

    /// Non-empty sentences across all paragraphs in source order
    pub sentences: Vec<String>,

    /// Whitespace-delimited tokens of the whole text
    pub words: Vec<String>,
}

impl StructuredData {
    /// The single-paragraph, single-sentence structure used when parsing fails.
    pub fn degenerate(text: &str) -> Self {
        Self {
            page_count: 1,
            paragraphs: vec![text.to_string()],
            sentences: vec![text.to_string()],
            words: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Replace the page count with an authoritative value.
    ///
    /// Values below 1 are clamped to 1.
    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = page_count.max(1);
        self
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Number of sentences.
    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Number of words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate() {
        let data = StructuredData::degenerate("one two\n\nthree");
        assert_eq!(data.page_count, 1);
        assert_eq!(data.paragraphs, vec!["one two\n\nthree"]);
        assert_eq!(data.sentences, vec!["one two\n\nthree"]);
        assert_eq!(data.words, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_with_page_count_clamps() {
        let data = StructuredData::degenerate("x").with_page_count(0);
        assert_eq!(data.page_count, 1);
        let data = data.with_page_count(7);
        assert_eq!(data.page_count, 7);
    }
}
