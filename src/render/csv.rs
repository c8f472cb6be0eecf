//! Line-oriented CSV encoding.
//!
//! Every line of the document becomes one `(line number, line text)` row.
//! Files carry a UTF-8 byte-order mark, quote every field, and end rows with
//! CRLF so spreadsheet applications open them without an import dialog.
//!
//! Rows are written by a [`VerifiedCsvWriter`]: a primary backend (the `csv`
//! crate) writes first, the staged file is synced and measured, and if it
//! came out empty (or the primary failed) a plain string-building fallback
//! rewrites the same rows.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::durable::{write_artifact, StagedFile};
use super::{Encoder, OutputFormat};
use crate::error::{Error, Result};
use crate::events::{default_sink, EventSink, PipelineEvent};
use crate::model::StructuredData;

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header row of every CSV artifact.
pub const CSV_HEADER: [&str; 2] = ["Line Number", "Line Text"];

/// One CSV record.
pub type CsvRow = [String; 2];

/// Split text into lines.
///
/// Breaks at `\n`, `\r\n`, `\r`, and the other Unicode line boundaries
/// (VT, FF, FS, GS, RS, NEL, LS, PS). A terminator at the very end does not
/// start an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let is_break = matches!(
            ch,
            '\n' | '\r'
                | '\u{0B}'
                | '\u{0C}'
                | '\u{1C}'
                | '\u{1D}'
                | '\u{1E}'
                | '\u{85}'
                | '\u{2028}'
                | '\u{2029}'
        );
        if !is_break {
            continue;
        }

        lines.push(&text[start..i]);
        let mut end = i + ch.len_utf8();
        if ch == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                end = j + 1;
            }
        }
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Build the header and line rows for `text`.
///
/// Text with no lines at all yields a single `(1, text)` row.
pub fn csv_rows(text: &str) -> Vec<CsvRow> {
    let lines = split_lines(text);
    let mut rows = Vec::with_capacity(lines.len() + 1);
    rows.push([CSV_HEADER[0].to_string(), CSV_HEADER[1].to_string()]);

    for (i, line) in lines.iter().enumerate() {
        rows.push([(i + 1).to_string(), (*line).to_string()]);
    }
    if lines.is_empty() {
        rows.push(["1".to_string(), text.to_string()]);
    }
    rows
}

/// A strategy for serializing rows.
pub trait CsvBackend: Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &str;

    /// Serialize `rows` into `out`, quoting every field and ending each row
    /// with CRLF.
    fn write_rows(&self, rows: &[CsvRow], out: &mut dyn Write) -> Result<()>;
}

/// Backend using the `csv` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryCsvBackend;

impl CsvBackend for LibraryCsvBackend {
    fn name(&self) -> &str {
        "csv-writer"
    }

    fn write_rows(&self, rows: &[CsvRow], out: &mut dyn Write) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::CRLF)
            .from_writer(out);

        for row in rows {
            writer
                .write_record(row)
                .map_err(|e| Error::encoding("CSV writer", e))?;
        }
        writer
            .flush()
            .map_err(|e| Error::encoding("CSV writer flush", e))
    }
}

/// Backend that builds each row by hand, doubling embedded quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualCsvBackend;

impl ManualCsvBackend {
    fn format_row(row: &CsvRow) -> String {
        let cells: Vec<String> = row.iter().map(|cell| cell.replace('"', "\"\"")).collect();
        format!("\"{}\"\r\n", cells.join("\",\""))
    }
}

impl CsvBackend for ManualCsvBackend {
    fn name(&self) -> &str {
        "manual"
    }

    fn write_rows(&self, rows: &[CsvRow], out: &mut dyn Write) -> Result<()> {
        let body: String = rows.iter().map(Self::format_row).collect();
        out.write_all(body.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| Error::encoding("CSV string write", e))
    }
}

/// Emits the byte-order mark just before the first byte of content, so an
/// empty write produces an empty file.
struct BomWriter<W: Write> {
    inner: W,
    pending: bool,
}

impl<W: Write> BomWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            pending: true,
        }
    }
}

impl<W: Write> Write for BomWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pending {
            self.inner.write_all(UTF8_BOM)?;
            self.pending = false;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Write, verify, and fall back once if the result is empty.
pub struct VerifiedCsvWriter {
    primary: Box<dyn CsvBackend>,
    fallback: Box<dyn CsvBackend>,
    events: Arc<dyn EventSink>,
}

impl VerifiedCsvWriter {
    /// Library writer first, manual string building as fallback.
    pub fn new() -> Self {
        Self::with_backends(Box::new(LibraryCsvBackend), Box::new(ManualCsvBackend))
    }

    /// Use custom backends.
    pub fn with_backends(primary: Box<dyn CsvBackend>, fallback: Box<dyn CsvBackend>) -> Self {
        Self {
            primary,
            fallback,
            events: default_sink(),
        }
    }

    /// Set the event sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Write `rows` to `target` and return the verified size in bytes.
    pub fn write(&self, rows: &[CsvRow], target: &Path) -> Result<u64> {
        let mut staged = StagedFile::create(target)?;

        let size = match self.write_with(self.primary.as_ref(), rows, &mut staged) {
            Ok(size) => size,
            Err(e) => {
                log::warn!(
                    "CSV backend {} failed for {}: {}",
                    self.primary.name(),
                    target.display(),
                    e
                );
                0
            }
        };

        let size = if size == 0 {
            self.events.emit(&PipelineEvent::CsvFallback {
                path: target.to_path_buf(),
            });
            staged.truncate()?;
            self.write_with(self.fallback.as_ref(), rows, &mut staged)?
        } else {
            size
        };

        if size == 0 {
            return Err(Error::EncodingFailure(format!(
                "{} is empty after fallback write",
                target.display()
            )));
        }

        staged.commit()?;
        Ok(size)
    }

    fn write_with(
        &self,
        backend: &dyn CsvBackend,
        rows: &[CsvRow],
        staged: &mut StagedFile,
    ) -> Result<u64> {
        {
            let mut out = BomWriter::new(staged.file());
            backend.write_rows(rows, &mut out)?;
            out.flush()
                .map_err(|e| Error::encoding("CSV flush", e))?;
        }
        staged.sync()
    }
}

impl Default for VerifiedCsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes line-oriented CSV artifacts.
pub struct CsvEncoder {
    writer: VerifiedCsvWriter,
    text_companion: bool,
    events: Arc<dyn EventSink>,
}

impl CsvEncoder {
    /// Create an encoder with the default writer.
    pub fn new() -> Self {
        Self {
            writer: VerifiedCsvWriter::new(),
            text_companion: false,
            events: default_sink(),
        }
    }

    /// Replace the row writer.
    pub fn with_writer(mut self, writer: VerifiedCsvWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Also persist the verbatim text next to the CSV (`<output>.txt`).
    pub fn with_text_companion(mut self, enabled: bool) -> Self {
        self.text_companion = enabled;
        self
    }

    /// Set the event sink for the encoder and its writer.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.writer = self.writer.with_events(events.clone());
        self.events = events;
        self
    }

    /// Path of the raw text companion for `output`.
    pub fn companion_path(output: &Path) -> PathBuf {
        output.with_extension(OutputFormat::Txt.extension())
    }
}

impl Default for CsvEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for CsvEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }

    fn encode(&self, text: &str, _data: &StructuredData, output: &Path) -> Result<u64> {
        self.events.emit(&PipelineEvent::EncodeStarted {
            format: OutputFormat::Csv,
            path: output.to_path_buf(),
        });

        let rows = csv_rows(text);
        log::debug!("Line-based CSV rows: {}", rows.len());
        let bytes = self.writer.write(&rows, output)?;

        // Only once the CSV itself is in place.
        if self.text_companion {
            let companion = Self::companion_path(output);
            if companion != output {
                write_artifact(&companion, text.as_bytes())?;
            }
        }

        self.events.emit(&PipelineEvent::ArtifactWritten {
            format: OutputFormat::Csv,
            path: output.to_path_buf(),
            bytes,
        });
        Ok(bytes)
    }
}
