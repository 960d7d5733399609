//! Grayscale conversion with gamma and contrast boost
//!
//! Pushes a photographed page toward a near-binary image while keeping
//! intermediate tones, so that the later sharpen/denoise passes still have
//! something to work with.

use tracing::debug;

use super::buffer::{luminance, PixelBuffer};

const GAMMA: f32 = 0.6;
const CONTRAST: f32 = 2.5;
const BRIGHT_KNEE: f32 = 140.0;
const DARK_KNEE: f32 = 115.0;

/// Inverted-text sampling parameters
const INVERT_MAX_SAMPLES: usize = 10_000;
const INVERT_DARK_LEVEL: f32 = 80.0;
const INVERT_BRIGHT_LEVEL: f32 = 180.0;
const INVERT_RATIO: f32 = 0.3;
const INVERT_PIXEL_LEVEL: f32 = 150.0;

/// Map one luminance value through gamma, contrast stretch and the split knee
pub fn enhance_level(gray: f32) -> u8 {
    let mut p = 255.0 * (gray / 255.0).powf(GAMMA);
    p = (p - 128.0) * CONTRAST + 128.0;

    if p > BRIGHT_KNEE {
        p = (p * 1.1).min(255.0);
    } else if p < DARK_KNEE {
        p = (p * 0.7).max(0.0);
    }

    p.clamp(0.0, 255.0).round() as u8
}

/// Grayscale + contrast enhancement, returning a new opaque buffer
pub fn enhance(buffer: &PixelBuffer) -> PixelBuffer {
    enhance_with_inversion(buffer, false)
}

/// Like [`enhance`], optionally flipping bright pixels first when the page
/// looks like light text on a dark background
pub fn enhance_with_inversion(buffer: &PixelBuffer, invert_light_text: bool) -> PixelBuffer {
    let invert = invert_light_text && detect_inverted_text(buffer);
    if invert {
        debug!("Light-on-dark text detected, inverting bright pixels");
    }

    let mut out = buffer.clone();
    for px in out.as_bytes_mut().chunks_exact_mut(4) {
        let mut gray = luminance(px[0], px[1], px[2]);
        if invert && gray > INVERT_PIXEL_LEVEL {
            gray = 255.0 - gray;
        }

        let level = enhance_level(gray);
        px[0] = level;
        px[1] = level;
        px[2] = level;
        px[3] = 255;
    }
    out
}

/// Heuristic check for light text printed on dark areas
///
/// Samples up to 10k pixels on an even stride. Returns true when more than
/// 30% of the dark samples have a bright pixel within two pixels.
pub fn detect_inverted_text(buffer: &PixelBuffer) -> bool {
    let (width, height) = buffer.dimensions();
    let total = width as usize * height as usize;
    if total == 0 {
        return false;
    }

    let samples = INVERT_MAX_SAMPLES.min((total / 4).max(1));
    let stride = (total / samples).max(1);

    let mut dark = 0usize;
    let mut bright_in_dark = 0usize;

    for i in (0..total).step_by(stride) {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        if buffer.gray_at(x, y) < INVERT_DARK_LEVEL {
            dark += 1;
            if has_bright_neighbor(buffer, x, y) {
                bright_in_dark += 1;
            }
        }
    }

    let ratio = bright_in_dark as f32 / dark.max(1) as f32;
    debug!(
        "Inverted text check: {} dark samples, {} with bright neighbours ({:.2})",
        dark, bright_in_dark, ratio
    );
    ratio > INVERT_RATIO
}

fn has_bright_neighbor(buffer: &PixelBuffer, x: u32, y: u32) -> bool {
    let (width, height) = buffer.dimensions();
    for dy in -2i64..=2 {
        for dx in -2i64..=2 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                continue;
            }
            if buffer.gray_at(nx as u32, ny as u32) > INVERT_BRIGHT_LEVEL {
                return true;
            }
        }
    }
    false
}
