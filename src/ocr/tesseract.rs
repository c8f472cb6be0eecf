//! Recognizer backed by the `tesseract` command-line engine.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::{DynamicImage, ImageFormat};

use super::{RecognitionMode, Recognizer};
use crate::error::{Error, Result};

/// Runs `tesseract <png> stdout --oem N --psm M -l LANG` per page.
///
/// Each page is written to a temporary PNG that is removed as soon as the
/// engine returns.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: PathBuf,
}

impl TesseractRecognizer {
    /// Use `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
        }
    }

    /// Use a specific executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Path of the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the argument list for one input file.
    fn args(input: &Path, mode: &RecognitionMode) -> Vec<String> {
        vec![
            input.display().to_string(),
            "stdout".to_string(),
            "--oem".to_string(),
            mode.engine.as_oem().to_string(),
            "--psm".to_string(),
            mode.segmentation.as_psm().to_string(),
            "-l".to_string(),
            mode.language.clone(),
        ]
    }

    fn spawn_error(&self, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            Error::RecognitionFailure(format!(
                "{} not found; install Tesseract OCR or set its path",
                self.program.display()
            ))
        } else {
            Error::RecognitionFailure(format!("failed to run {}: {}", self.program.display(), err))
        }
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage, mode: &RecognitionMode) -> Result<String> {
        let input = tempfile::Builder::new()
            .prefix("unscan-page-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| Error::RecognitionFailure(format!("failed to stage page image: {}", e)))?;

        let output = Command::new(&self.program)
            .args(Self::args(input.path(), mode))
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::RecognitionFailure(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn probe(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            return Err(Error::RecognitionFailure(format!(
                "{} --version exited with {}",
                self.program.display(),
                output.status
            )));
        }
        // Older releases print the banner on stderr
        let banner = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        Ok(banner.lines().next().unwrap_or("tesseract").trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::SegmentationMode;

    #[test]
    fn test_args_default_mode() {
        let args = TesseractRecognizer::args(Path::new("/tmp/p.png"), &RecognitionMode::default());
        assert_eq!(
            args,
            vec!["/tmp/p.png", "stdout", "--oem", "3", "--psm", "6", "-l", "eng"]
        );
    }

    #[test]
    fn test_args_custom_mode() {
        let mode = RecognitionMode::new()
            .with_segmentation(SegmentationMode::SparseText)
            .with_language("fra");
        let args = TesseractRecognizer::args(Path::new("x.png"), &mode);
        assert!(args.windows(2).any(|w| w == ["--psm", "11"]));
        assert!(args.windows(2).any(|w| w == ["-l", "fra"]));
    }

    #[test]
    fn test_missing_program_is_recognition_failure() {
        let recognizer = TesseractRecognizer::with_program("/nonexistent/tesseract-binary");
        let image = DynamicImage::new_rgb8(4, 4);
        let result = recognizer.recognize(&image, &RecognitionMode::default());
        assert!(matches!(result, Err(Error::RecognitionFailure(_))));
        assert!(recognizer.probe().is_err());
    }
}
