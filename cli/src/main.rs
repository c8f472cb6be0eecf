//! unscan CLI - OCR conversion tool for scanned documents

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unscan::{
    default_output_path, EventSink, JsonFormat, LogSink, OutputFormat, PageRenderer,
    PdftoppmRenderer, PipelineEvent, Recognizer, TesseractRecognizer, Unscan,
    SUPPORTED_EXTENSIONS,
};

#[derive(Parser)]
#[command(name = "unscan")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert scanned PDFs and images to JSON, CSV, and text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a scanned document to json, csv, or txt
    Convert {
        /// Input PDF or image file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output format (json, csv, txt)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (defaults to the input path with the format extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Also write the raw text next to a CSV artifact
        #[arg(long)]
        keep_text: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Print the extracted text
    Text {
        /// Input PDF or image file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Show text statistics of a document
    Stats {
        /// Input PDF or image file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// List supported input and output formats
    Formats,

    /// Check that the OCR and rasterizer executables are available
    Check {
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args, Clone, Debug)]
struct BackendArgs {
    /// Tesseract executable
    #[arg(long, env = "UNSCAN_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// pdftoppm executable
    #[arg(long, env = "UNSCAN_PDFTOPPM", default_value = "pdftoppm")]
    pdftoppm: PathBuf,

    /// Recognition language
    #[arg(long, env = "UNSCAN_LANG", default_value = "eng")]
    lang: String,

    /// Rendering resolution for PDF pages
    #[arg(long, env = "UNSCAN_DPI", default_value_t = 300)]
    dpi: u32,

    /// Recognize pages one at a time
    #[arg(long)]
    sequential: bool,
}

impl BackendArgs {
    fn recognizer(&self) -> TesseractRecognizer {
        TesseractRecognizer::with_program(&self.tesseract)
    }

    fn renderer(&self) -> PdftoppmRenderer {
        PdftoppmRenderer::with_program(&self.pdftoppm)
    }

    fn unscan(&self, events: Arc<dyn EventSink>) -> Unscan {
        let mut unscan = Unscan::new()
            .with_recognizer(Arc::new(self.recognizer()))
            .with_renderer(Arc::new(self.renderer()))
            .with_dpi(self.dpi)
            .with_language(self.lang.clone())
            .with_events(events);
        if self.sequential {
            unscan = unscan.sequential();
        }
        unscan
    }
}

/// Mirrors pipeline progress onto a spinner and the log.
struct ProgressSink {
    bar: ProgressBar,
}

impl ProgressSink {
    fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl EventSink for ProgressSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::PagesRasterized { count } => {
                self.bar.set_message(format!("Recognizing {} page(s)...", count));
            }
            PipelineEvent::PageExtracted { index, total, .. } => {
                self.bar.set_message(format!("Recognized page {}/{}", index, total));
            }
            PipelineEvent::EncodeStarted { format, .. } => {
                self.bar.set_message(format!("Writing {}...", format));
            }
            _ => {}
        }
        LogSink.emit(event);
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            format,
            output,
            keep_text,
            compact,
            backend,
        } => cmd_convert(&input, &format, output.as_deref(), keep_text, compact, &backend),
        Commands::Text {
            input,
            output,
            backend,
        } => cmd_text(&input, output.as_deref(), &backend),
        Commands::Stats {
            input,
            json,
            backend,
        } => cmd_stats(&input, json, &backend),
        Commands::Formats => {
            cmd_formats();
            Ok(())
        }
        Commands::Check { backend } => cmd_check(&backend),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(exit_code(e.as_ref()));
    }
}

/// 2 for errors the caller can fix (bad input, no text), 1 otherwise.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<unscan::Error>() {
        Some(e) if e.is_user_actionable() => 2,
        _ => 1,
    }
}

fn cmd_convert(
    input: &Path,
    format: &str,
    output: Option<&Path>,
    keep_text: bool,
    compact: bool,
    backend: &BackendArgs,
) -> CmdResult {
    // Reject a bad tag before any OCR work.
    let format: OutputFormat = format.parse()?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input, format));

    let progress = Arc::new(ProgressSink::start("Rasterizing..."));
    let json_format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let result = backend
        .unscan(progress.clone())
        .with_json_format(json_format)
        .with_text_companion(keep_text)
        .convert(input, format, &output);

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            progress.abandon();
            return Err(e.into());
        }
    };
    progress.finish("Done!");

    println!("\n{}", "Output files:".green().bold());
    if keep_text && format == OutputFormat::Csv {
        println!("  {} {}", "├─".dimmed(), output.display());
        println!(
            "  {} {}",
            "└─".dimmed(),
            unscan::CsvEncoder::companion_path(&output).display()
        );
    } else {
        println!("  {} {}", "└─".dimmed(), output.display());
    }
    println!(
        "{} {} of {} page(s) with text, {} chars, {} bytes in {} ms",
        "Converted".green(),
        report.pages_with_text,
        report.total_pages,
        report.characters,
        report.bytes_written,
        report.elapsed().num_milliseconds()
    );

    Ok(())
}

fn cmd_text(input: &Path, output: Option<&Path>, backend: &BackendArgs) -> CmdResult {
    let document = backend.unscan(Arc::new(LogSink)).extract(input)?;

    if let Some(path) = output {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, document.as_str())?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", document);
    }

    Ok(())
}

fn cmd_stats(input: &Path, json: bool, backend: &BackendArgs) -> CmdResult {
    let (document, data) = backend.unscan(Arc::new(LogSink)).analyze(input)?;

    if json {
        let value = serde_json::json!({
            "file": input.display().to_string(),
            "kind": document.kind,
            "total_pages": document.total_pages,
            "pages_with_text": document.pages_with_text,
            "paragraphs": data.paragraph_count(),
            "sentences": data.sentence_count(),
            "words": document.as_str().split_whitespace().count(),
            "characters": document.char_count(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Document Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), document.total_pages);
    println!(
        "{}: {}",
        "Pages with text".bold(),
        document.pages_with_text.len()
    );
    println!("{}: {}", "Blank pages".bold(), document.blank_pages());
    println!("{}: {}", "Paragraphs".bold(), data.paragraph_count());
    println!("{}: {}", "Sentences".bold(), data.sentence_count());
    println!(
        "{}: {}",
        "Words".bold(),
        document.as_str().split_whitespace().count()
    );
    println!("{}: {}", "Characters".bold(), document.char_count());

    Ok(())
}

fn cmd_formats() {
    println!("{}", "Input formats".cyan().bold());
    println!("  {}", SUPPORTED_EXTENSIONS.join(", "));
    println!();
    println!("{}", "Output formats".cyan().bold());
    for format in OutputFormat::ALL {
        println!("  {:<5} {}", format.as_str(), format.mime_type().dimmed());
    }
}

fn cmd_check(backend: &BackendArgs) -> CmdResult {
    let recognizer = backend.recognizer();
    let renderer = backend.renderer();

    let mut failed = false;
    for (name, probe) in [
        (recognizer.name().to_string(), recognizer.probe()),
        (renderer.name().to_string(), renderer.probe()),
    ] {
        match probe {
            Ok(version) => println!("{} {}: {}", "✓".green(), name.bold(), version),
            Err(e) => {
                println!("{} {}: {}", "✗".red(), name.bold(), e);
                failed = true;
            }
        }
    }

    if failed {
        return Err("required executables are missing; install tesseract-ocr and poppler-utils".into());
    }
    println!("\n{}", "All backends available".green().bold());
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "unscan".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("OCR conversion tool for scanned documents");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/unscan".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert_args() {
        let cli = Cli::try_parse_from([
            "unscan", "convert", "scan.pdf", "-f", "csv", "--keep-text", "--dpi", "150",
        ])
        .unwrap();

        match cli.command {
            Commands::Convert {
                input,
                format,
                output,
                keep_text,
                backend,
                ..
            } => {
                assert_eq!(input, PathBuf::from("scan.pdf"));
                assert_eq!(format, "csv");
                assert!(output.is_none());
                assert!(keep_text);
                assert_eq!(backend.dpi, 150);
                assert!(!backend.sequential);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_exit_code_for_bad_format() {
        let err: Box<dyn std::error::Error> = "xml".parse::<OutputFormat>().unwrap_err().into();
        assert_eq!(exit_code(err.as_ref()), 2);
    }

    #[test]
    fn test_exit_code_for_internal_error() {
        let err: Box<dyn std::error::Error> =
            unscan::Error::RecognitionFailure("engine crashed".into()).into();
        assert_eq!(exit_code(err.as_ref()), 1);

        let err: Box<dyn std::error::Error> = "plain message".into();
        assert_eq!(exit_code(err.as_ref()), 1);
    }

    #[test]
    fn test_convert_rejects_format_before_work() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.png");
        let backend = BackendArgs {
            tesseract: PathBuf::from("tesseract"),
            pdftoppm: PathBuf::from("pdftoppm"),
            lang: "eng".into(),
            dpi: 300,
            sequential: false,
        };

        let err = cmd_convert(&input, "xml", None, false, false, &backend).unwrap_err();
        assert_eq!(exit_code(err.as_ref()), 2);
        assert!(!dir.path().join("missing.xml").exists());
    }
}
