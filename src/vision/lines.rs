//! Table ruling detection and removal
//!
//! Finds long axis-aligned dark runs with a run-length scan that tolerates
//! short breaks, then paints them white so ruled cells do not bleed into
//! the recognized glyphs.

use tracing::debug;

use super::buffer::PixelBuffer;

/// Luminance below which a pixel counts as ink
const DARK_LEVEL: f32 = 128.0;
/// Longest light gap bridged inside a run
const MAX_GAP: u32 = 5;
/// Minimum run length as a fraction of the scan-line extent
const MIN_LENGTH_RATIO: f64 = 0.3;

/// Orientation of a detected ruling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A detected ruling on one row or column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSegment {
    pub axis: Axis,
    /// Row index for horizontal lines, column index for vertical ones
    pub fixed: u32,
    /// Covered coordinates along the scan axis, ascending
    pub covered: Vec<u32>,
}

/// Gap-tolerant run accumulator for a single scan line
struct RunScanner {
    min_length: usize,
    run: Vec<u32>,
    gap: u32,
    runs: Vec<Vec<u32>>,
}

impl RunScanner {
    fn new(extent: u32) -> Self {
        Self {
            min_length: (extent as f64 * MIN_LENGTH_RATIO).floor() as usize,
            run: Vec::new(),
            gap: 0,
            runs: Vec::new(),
        }
    }

    fn push(&mut self, coord: u32, dark: bool) {
        if dark {
            if self.gap > 0 && self.gap <= MAX_GAP {
                self.run.extend(coord - self.gap..coord);
            }
            self.run.push(coord);
            self.gap = 0;
        } else {
            if !self.run.is_empty() {
                self.gap += 1;
            }
            if self.gap > MAX_GAP {
                self.close();
            }
        }
    }

    fn close(&mut self) {
        let run = std::mem::take(&mut self.run);
        if !run.is_empty() && run.len() >= self.min_length {
            self.runs.push(run);
        }
        self.gap = 0;
    }

    fn finish(mut self) -> Vec<Vec<u32>> {
        self.close();
        self.runs
    }
}

/// Detect horizontal rulings in a row-major luminance grid
pub fn detect_horizontal(gray: &[f32], width: u32, height: u32) -> Vec<LineSegment> {
    let mut lines = Vec::new();
    for y in 0..height {
        let mut scanner = RunScanner::new(width);
        for x in 0..width {
            let g = gray[(y * width + x) as usize];
            scanner.push(x, g < DARK_LEVEL);
        }
        lines.extend(scanner.finish().into_iter().map(|covered| LineSegment {
            axis: Axis::Horizontal,
            fixed: y,
            covered,
        }));
    }
    lines
}

/// Detect vertical rulings in a row-major luminance grid
pub fn detect_vertical(gray: &[f32], width: u32, height: u32) -> Vec<LineSegment> {
    let mut lines = Vec::new();
    for x in 0..width {
        let mut scanner = RunScanner::new(height);
        for y in 0..height {
            let g = gray[(y * width + x) as usize];
            scanner.push(y, g < DARK_LEVEL);
        }
        lines.extend(scanner.finish().into_iter().map(|covered| LineSegment {
            axis: Axis::Vertical,
            fixed: x,
            covered,
        }));
    }
    lines
}

/// Paint every covered pixel white, keeping alpha
pub fn remove_lines(buffer: &mut PixelBuffer, lines: &[LineSegment]) {
    for line in lines {
        for &c in &line.covered {
            let (x, y) = match line.axis {
                Axis::Horizontal => (c, line.fixed),
                Axis::Vertical => (line.fixed, c),
            };
            buffer.set_rgb(x, y, 255);
        }
    }
}

/// Detect both orientations on the current image, then erase them
///
/// Returns the number of (horizontal, vertical) lines removed.
pub fn remove_table_lines(buffer: &mut PixelBuffer) -> (usize, usize) {
    let (width, height) = buffer.dimensions();
    let gray = buffer.grayscale_grid();

    let horizontal = detect_horizontal(&gray, width, height);
    let vertical = detect_vertical(&gray, width, height);
    remove_lines(buffer, &horizontal);
    remove_lines(buffer, &vertical);

    debug!(
        "Removed {} horizontal and {} vertical lines",
        horizontal.len(),
        vertical.len()
    );
    (horizontal.len(), vertical.len())
}
