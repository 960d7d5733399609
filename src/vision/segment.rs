//! Grid-based content segmentation
//!
//! Splits a page into a fixed grid and keeps the cells that carry enough
//! ink to be worth recognizing on their own.

use tracing::debug;

use super::buffer::{PixelBuffer, Rect};

/// Luminance below which a pixel counts as content
const CONTENT_LEVEL: f32 = 200.0;
/// Minimum share of content pixels for a cell to be kept
const MIN_CONTENT_RATIO: f64 = 0.05;

/// A grid cell selected for recognition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub row: u32,
    pub col: u32,
}

impl Region {
    /// Pixel rectangle of this cell
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Partition `image` into `rows x cols` cells and keep the non-empty ones
///
/// Cells are `floor(dim / count)` pixels; the last row and column absorb the
/// remainder so the grid tiles the image exactly. Output is row-major.
pub fn segment(image: &PixelBuffer, rows: u32, cols: u32) -> Vec<Region> {
    let (width, height) = image.dimensions();
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    let cell_width = width / cols;
    let cell_height = height / rows;
    let mut regions = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let x = col * cell_width;
            let y = row * cell_height;
            let region = Region {
                x,
                y,
                width: if col == cols - 1 { width - x } else { cell_width },
                height: if row == rows - 1 { height - y } else { cell_height },
                row,
                col,
            };

            if has_significant_content(image, &region) {
                regions.push(region);
            }
        }
    }

    debug!(
        "Segmented {}x{} image into {} of {} cells",
        width,
        height,
        regions.len(),
        rows * cols
    );
    regions
}

/// True when more than 5% of the cell's pixels are darker than near-white
pub fn has_significant_content(image: &PixelBuffer, region: &Region) -> bool {
    let total = region.width as u64 * region.height as u64;
    if total == 0 {
        return false;
    }

    let mut content = 0u64;
    for y in region.y..region.y + region.height {
        for x in region.x..region.x + region.width {
            if image.gray_at(x, y) < CONTENT_LEVEL {
                content += 1;
            }
        }
    }

    content as f64 / total as f64 > MIN_CONTENT_RATIO
}
