//! Source format detection and validation.

use crate::error::{Error, Result};
use crate::model::SourceKind;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Extensions accepted as input, lowercase without the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tiff", "bmp"];

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Determine the source kind from a path's extension.
///
/// # Returns
/// * `Ok(SourceKind::MultiPage)` for `.pdf`
/// * `Ok(SourceKind::SingleImage)` for the supported raster extensions
/// * `Err(Error::UnsupportedFormat)` otherwise
///
/// # Example
/// ```
/// use unscan::detect::detect_kind_from_path;
/// use unscan::SourceKind;
///
/// assert_eq!(detect_kind_from_path("scan.PNG").unwrap(), SourceKind::SingleImage);
/// assert!(detect_kind_from_path("notes.docx").is_err());
/// ```
pub fn detect_kind_from_path<P: AsRef<Path>>(path: P) -> Result<SourceKind> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    detect_kind_from_extension(&ext)
}

/// Determine the source kind from a bare extension (with or without a dot).
pub fn detect_kind_from_extension(ext: &str) -> Result<SourceKind> {
    let ext = ext.trim_start_matches('.').to_lowercase();
    match ext.as_str() {
        "pdf" => Ok(SourceKind::MultiPage),
        "png" | "jpg" | "jpeg" | "tiff" | "bmp" => Ok(SourceKind::SingleImage),
        "" => Err(Error::UnsupportedFormat(format!(
            "file has no extension. Allowed types: {}",
            SUPPORTED_EXTENSIONS.join(", ")
        ))),
        other => Err(Error::UnsupportedFormat(format!(
            "file type .{} not supported. Allowed types: {}",
            other,
            SUPPORTED_EXTENSIONS.join(", ")
        ))),
    }
}

/// Check whether an extension is accepted as input.
pub fn is_supported_extension(ext: &str) -> bool {
    detect_kind_from_extension(ext).is_ok()
}

/// Check if bytes start with a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

/// Check if a file starts with a PDF header.
pub fn is_pdf_file<P: AsRef<Path>>(path: P) -> Result<bool> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 5];
    let mut read = 0;
    while read < header.len() {
        let n = file.read(&mut header[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    Ok(is_pdf_bytes(&header[..read]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_pdf() {
        assert_eq!(
            detect_kind_from_path("report.pdf").unwrap(),
            SourceKind::MultiPage
        );
        assert_eq!(
            detect_kind_from_path("REPORT.PDF").unwrap(),
            SourceKind::MultiPage
        );
    }

    #[test]
    fn test_detect_images() {
        for ext in ["png", "jpg", "jpeg", "tiff", "bmp", "JPEG"] {
            let path = format!("scan.{}", ext);
            assert_eq!(
                detect_kind_from_path(&path).unwrap(),
                SourceKind::SingleImage,
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_detect_unsupported() {
        let result = detect_kind_from_path("archive.zip");
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));

        let result = detect_kind_from_path("README");
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_extension_with_dot() {
        assert!(is_supported_extension(".tiff"));
        assert!(!is_supported_extension(".gif"));
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.4\n"));
        assert!(!is_pdf_bytes(b"Not a PDF"));
        assert!(!is_pdf_bytes(b"%PD"));
    }

    #[test]
    fn test_is_pdf_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7\n%test").unwrap();
        assert!(is_pdf_file(file.path()).unwrap());

        let mut short = tempfile::NamedTempFile::new().unwrap();
        short.write_all(b"%P").unwrap();
        assert!(!is_pdf_file(short.path()).unwrap());
    }
}
