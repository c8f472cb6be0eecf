//! Page renderer backed by the poppler `pdftoppm` executable.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{PageRenderer, RenderedPage};
use crate::error::{Error, Result};

const OUTPUT_PREFIX: &str = "page";

/// Renders PDF pages to PNG files with `pdftoppm -r <dpi> -png`.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    program: PathBuf,
}

impl PdftoppmRenderer {
    /// Use `pdftoppm` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("pdftoppm"),
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

    fn spawn_error(&self, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            Error::Rasterization(format!(
                "{} not found; install poppler-utils or set its path",
                self.program.display()
            ))
        } else {
            Error::Rasterization(format!("failed to run {}: {}", self.program.display(), err))
        }
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    fn render_pages(&self, path: &Path, dpi: u32, scratch: &Path) -> Result<Vec<RenderedPage>> {
        let output = Command::new(&self.program)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(path)
            .arg(scratch.join(OUTPUT_PREFIX))
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Rasterization(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let files = collect_page_files(scratch)?;
        log::debug!("pdftoppm rendered {} page(s) at {} dpi", files.len(), dpi);
        Ok(files.into_iter().map(RenderedPage::File).collect())
    }

    fn probe(&self) -> Result<String> {
        // pdftoppm prints its version banner on stderr
        let output = Command::new(&self.program)
            .arg("-v")
            .output()
            .map_err(|e| self.spawn_error(e))?;
        let banner = String::from_utf8_lossy(&output.stderr);
        let banner = if banner.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            banner.into_owned()
        };
        Ok(banner.lines().next().unwrap_or("pdftoppm").trim().to_string())
    }
}

/// List `page-<n>.png` files in `dir`, ordered by `n`.
///
/// `pdftoppm` zero-pads the page number to the width of the page count, so
/// lexical order is not reliable across documents.
fn collect_page_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut numbered = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(number) = page_number(&path) {
            numbered.push((number, path));
        }
    }
    numbered.sort_by_key(|(number, _)| *number);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(OUTPUT_PREFIX)?.strip_prefix('-')?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number() {
        assert_eq!(page_number(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_number(Path::new("/tmp/x/page-010.png")), Some(10));
        assert_eq!(page_number(Path::new("/tmp/x/page-2.ppm")), None);
        assert_eq!(page_number(Path::new("/tmp/x/other-2.png")), None);
    }

    #[test]
    fn test_collect_page_files_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = collect_page_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
    }

    #[test]
    fn test_missing_program() {
        let renderer = PdftoppmRenderer::with_program("/nonexistent/pdftoppm-binary");
        let dir = tempfile::tempdir().unwrap();
        let result = renderer.render_pages(Path::new("doc.pdf"), 300, dir.path());
        assert!(matches!(result, Err(Error::Rasterization(_))));
        assert!(renderer.probe().is_err());
    }
}
