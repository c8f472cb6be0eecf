//! Page-level types.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// A rasterized page held in memory.
///
/// Owned by whichever component is processing it and dropped once its text
/// has been captured.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Page number (1-indexed)
    pub index: u32,

    /// RGB raster of the page
    pub image: DynamicImage,
}

impl PageImage {
    /// Create a new page image.
    pub fn new(index: u32, image: DynamicImage) -> Self {
        Self { index, image }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Cleaned text recognized on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// Page number (1-indexed)
    pub page_index: u32,

    /// Normalized page text
    pub text: String,

    /// True when nothing recognizable was found
    pub is_blank: bool,
}

impl ExtractedPage {
    /// Create an extracted page; blankness is derived from the text.
    pub fn new(page_index: u32, text: String) -> Self {
        let is_blank = text.trim().is_empty();
        Self {
            page_index,
            text,
            is_blank,
        }
    }
}
