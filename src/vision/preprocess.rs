//! The enhancement chain run on every image handed to the recognizer
//!
//! Order: upscale, then either binarize or enhance + sharpen + denoise,
//! then ruling removal, then circle-frame removal. Binarization already
//! drops the mid-tones the sharpen/denoise passes refine, so those are
//! skipped in binary mode. Cleanup runs last so it sees final pixels.

use tracing::debug;

use super::buffer::PixelBuffer;
use super::{circles, enhance, filters, lines, threshold};
use crate::config::PipelineConfig;

/// Which stages of the chain run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageFlags {
    pub advanced: bool,
    pub binary: bool,
    pub remove_lines: bool,
    pub remove_circles: bool,
    pub invert_light_text: bool,
}

impl StageFlags {
    /// Full chain as configured
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            advanced: config.advanced_mode,
            binary: config.binary_mode,
            remove_lines: config.remove_table_lines,
            remove_circles: config.remove_circle_frames,
            invert_light_text: config.invert_light_text,
        }
    }
}

/// Run the enhancement chain, returning a new buffer
pub fn preprocess(image: &PixelBuffer, scale_factor: f64, flags: StageFlags) -> PixelBuffer {
    debug!(
        "Preprocessing {}x{}: scale={}, advanced={}, binary={}, lines={}, circles={}",
        image.width(),
        image.height(),
        scale_factor,
        flags.advanced,
        flags.binary,
        flags.remove_lines,
        flags.remove_circles
    );

    let scaled = image.scale(scale_factor);
    if !flags.advanced {
        return scaled;
    }

    let mut result = if flags.binary {
        threshold::binarize(&scaled)
    } else {
        let enhanced = enhance::enhance_with_inversion(&scaled, flags.invert_light_text);
        let mut sharpened = filters::sharpen(&enhanced);
        filters::denoise(&mut sharpened);
        sharpened
    };

    if flags.remove_lines {
        lines::remove_table_lines(&mut result);
    }
    if flags.remove_circles {
        circles::remove_circle_frames(&mut result);
    }

    result
}

/// Image used for region segmentation: grayscale + contrast only, no
/// scaling, so region coordinates stay valid for the source image
///
/// Sharpening and denoising are left out; they would shift the ink density
/// the segmenter measures. With advanced mode off this is a plain copy.
pub fn detection_image(image: &PixelBuffer, config: &PipelineConfig) -> PixelBuffer {
    if config.advanced_mode {
        enhance::enhance_with_inversion(image, config.invert_light_text)
    } else {
        image.clone()
    }
}
