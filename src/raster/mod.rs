//! Page rasterization.
//!
//! A [`Rasterizer`] turns a [`SourceDocument`] into an ordered
//! [`PageSequence`]. Paged sources go through a [`PageRenderer`] capability;
//! single images become a one-page sequence. Pages are loaded lazily so a
//! caller holds at most one decoded image per worker.

mod pdftoppm;

pub use pdftoppm::PdftoppmRenderer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use tempfile::TempDir;

use crate::detect::{detect_kind_from_path, is_pdf_file};
use crate::error::{Error, Result};
use crate::events::{default_sink, EventSink, PipelineEvent};
use crate::model::{PageImage, SourceDocument, SourceKind};

/// Resolution used when rendering paged sources.
pub const DEFAULT_DPI: u32 = 300;

/// One page as produced by a renderer.
#[derive(Debug, Clone)]
pub enum RenderedPage {
    /// Image file on disk, decoded on demand
    File(PathBuf),
    /// Already decoded image
    Image(DynamicImage),
}

/// Capability that renders every page of a paged document.
///
/// Implementations may write intermediate files into `scratch`; the
/// directory is removed once the resulting [`PageSequence`] is dropped.
pub trait PageRenderer: Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &str;

    /// Render all pages of `path` at `dpi`, in page order.
    fn render_pages(&self, path: &Path, dpi: u32, scratch: &Path) -> Result<Vec<RenderedPage>>;

    /// Report backend availability, returning a version or description.
    fn probe(&self) -> Result<String> {
        Ok(self.name().to_string())
    }
}

/// A page whose raster has not been decoded yet.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// Page number (1-indexed)
    pub index: u32,
    source: RenderedPage,
}

impl RasterPage {
    /// Create a page from a renderer output.
    pub fn new(index: u32, source: RenderedPage) -> Self {
        Self { index, source }
    }

    /// Decode the page into an RGB [`PageImage`].
    pub fn load(self) -> Result<PageImage> {
        let image = match self.source {
            RenderedPage::File(path) => image::open(&path)?,
            RenderedPage::Image(image) => image,
        };
        Ok(PageImage::new(self.index, normalize_color(image)))
    }
}

/// Convert any color model to RGB8, leaving RGB8 images untouched.
fn normalize_color(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Ordered pages of one source, plus any scratch storage backing them.
#[derive(Debug)]
pub struct PageSequence {
    kind: SourceKind,
    pages: Vec<RasterPage>,
    scratch: Option<TempDir>,
}

impl PageSequence {
    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Check if the sequence has no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Kind of the source the pages came from.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Split into the pages and a guard that keeps scratch files alive.
    ///
    /// The guard must outlive every [`RasterPage::load`] call.
    pub fn into_parts(self) -> (Vec<RasterPage>, ScratchGuard) {
        (
            self.pages,
            ScratchGuard {
                _dir: self.scratch,
            },
        )
    }
}

/// Keeps a renderer's scratch directory alive until dropped.
#[derive(Debug)]
pub struct ScratchGuard {
    _dir: Option<TempDir>,
}

/// Produces page sequences from source documents.
pub struct Rasterizer {
    renderer: Arc<dyn PageRenderer>,
    dpi: u32,
    events: Arc<dyn EventSink>,
}

impl Rasterizer {
    /// Create a rasterizer backed by `renderer` at [`DEFAULT_DPI`].
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            renderer,
            dpi: DEFAULT_DPI,
            events: default_sink(),
        }
    }

    /// Set the rendering resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the event sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Rendering resolution.
    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// The page renderer backing paged sources.
    pub fn renderer(&self) -> &Arc<dyn PageRenderer> {
        &self.renderer
    }

    /// Rasterize a source into an ordered page sequence.
    ///
    /// # Errors
    /// * [`Error::UnsupportedFormat`] for unsupported extensions
    /// * [`Error::EmptyDocument`] if a paged source yields no pages
    /// * [`Error::Rasterization`] if the renderer fails
    pub fn rasterize(&self, source: &SourceDocument) -> Result<PageSequence> {
        detect_kind_from_path(source.path())?;

        self.events.emit(&PipelineEvent::RasterizeStarted {
            path: source.path().to_path_buf(),
            kind: source.kind(),
        });

        let sequence = match source.kind() {
            SourceKind::SingleImage => PageSequence {
                kind: SourceKind::SingleImage,
                pages: vec![RasterPage::new(
                    1,
                    RenderedPage::File(source.path().to_path_buf()),
                )],
                scratch: None,
            },
            SourceKind::MultiPage => self.rasterize_paged(source.path())?,
        };

        self.events.emit(&PipelineEvent::PagesRasterized {
            count: sequence.len() as u32,
        });
        Ok(sequence)
    }

    fn rasterize_paged(&self, path: &Path) -> Result<PageSequence> {
        if !is_pdf_file(path)? {
            return Err(Error::Rasterization(format!(
                "{} is not a valid PDF",
                path.display()
            )));
        }

        let scratch = tempfile::Builder::new().prefix("unscan-").tempdir()?;
        let rendered = self.renderer.render_pages(path, self.dpi, scratch.path())?;
        if rendered.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let pages = rendered
            .into_iter()
            .enumerate()
            .map(|(i, page)| RasterPage::new(i as u32 + 1, page))
            .collect();

        Ok(PageSequence {
            kind: SourceKind::MultiPage,
            pages,
            scratch: Some(scratch),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use image::{GrayImage, RgbImage};
    use std::io::Write;

    struct FixedRenderer {
        pages: usize,
    }

    impl PageRenderer for FixedRenderer {
        fn name(&self) -> &str {
            "fixed"
        }

        fn render_pages(
            &self,
            _path: &Path,
            _dpi: u32,
            _scratch: &Path,
        ) -> Result<Vec<RenderedPage>> {
            Ok((0..self.pages)
                .map(|i| RenderedPage::Image(DynamicImage::new_rgb8(10 + i as u32, 10)))
                .collect())
        }
    }

    fn rasterizer(pages: usize) -> Rasterizer {
        Rasterizer::new(Arc::new(FixedRenderer { pages })).with_events(Arc::new(NullSink))
    }

    fn write_pdf_stub(dir: &Path) -> PathBuf {
        let path = dir.join("doc.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4\n%stub").unwrap();
        path
    }

    #[test]
    fn test_paged_source_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceDocument::from_path(write_pdf_stub(dir.path())).unwrap();

        let sequence = rasterizer(3).rasterize(&source).unwrap();
        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence.kind(), SourceKind::MultiPage);

        let (pages, _guard) = sequence.into_parts();
        let widths: Vec<u32> = pages
            .into_iter()
            .map(|p| {
                let image = p.load().unwrap();
                image.width()
            })
            .collect();
        assert_eq!(widths, vec![10, 11, 12]);
    }

    #[test]
    fn test_paged_source_without_pages() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceDocument::from_path(write_pdf_stub(dir.path())).unwrap();

        let result = rasterizer(0).rasterize(&source);
        assert!(matches!(result, Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_paged_source_with_bad_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"<html></html>").unwrap();
        let source = SourceDocument::from_path(&path).unwrap();

        let result = rasterizer(1).rasterize(&source);
        assert!(matches!(result, Err(Error::Rasterization(_))));
    }

    #[test]
    fn test_single_image_is_one_rgb_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::new(8, 6).save(&path).unwrap();
        let source = SourceDocument::from_path(&path).unwrap();

        let sequence = rasterizer(5).rasterize(&source).unwrap();
        assert_eq!(sequence.len(), 1);

        let (pages, _guard) = sequence.into_parts();
        let page = pages.into_iter().next().unwrap().load().unwrap();
        assert_eq!(page.index, 1);
        assert!(matches!(page.image, DynamicImage::ImageRgb8(_)));
        assert_eq!((page.width(), page.height()), (8, 6));
    }

    #[test]
    fn test_unsupported_extension() {
        let source = SourceDocument::new("clip.gif", SourceKind::SingleImage);
        let result = rasterizer(1).rasterize(&source);
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_normalize_color_keeps_rgb() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        assert!(matches!(normalize_color(rgb), DynamicImage::ImageRgb8(_)));
        let rgba = DynamicImage::new_rgba8(2, 2);
        assert!(matches!(normalize_color(rgba), DynamicImage::ImageRgb8(_)));
    }
}
