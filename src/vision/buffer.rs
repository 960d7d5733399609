//! In-memory RGBA image representation shared by every pipeline stage

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

use crate::error::{OcrError, Result};

/// Perceptual luminance of an RGB triple
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// An owned RGBA image
///
/// `data.len() == width * height * 4` always holds; channel order is R, G, B, A.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

/// A pixel-space rectangle inside a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, checking the length against the dimensions
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(OcrError::InvalidBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, width, height })
    }

    /// Create a buffer filled with a single opaque color
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self { data, width, height }
    }

    /// Decode an encoded image (PNG, JPEG, ...) from memory
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from(img))
    }

    /// Read and decode an image file
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw RGBA bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// RGBA value at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Set R, G and B at (x, y), leaving alpha untouched
    pub fn set_rgb(&mut self, x: u32, y: u32, value: u8) {
        let i = self.index(x, y);
        self.data[i] = value;
        self.data[i + 1] = value;
        self.data[i + 2] = value;
    }

    /// Luminance of the pixel at (x, y)
    pub fn gray_at(&self, x: u32, y: u32) -> f32 {
        let i = self.index(x, y);
        luminance(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Row-major luminance values for every pixel
    pub fn grayscale_grid(&self) -> Vec<f32> {
        self.data
            .chunks_exact(4)
            .map(|px| luminance(px[0], px[1], px[2]))
            .collect()
    }

    /// Copy out a rectangle, clamped to the buffer bounds
    pub fn crop(&self, rect: Rect) -> PixelBuffer {
        let x0 = rect.x.min(self.width);
        let y0 = rect.y.min(self.height);
        let w = rect.width.min(self.width - x0);
        let h = rect.height.min(self.height - y0);

        let mut data = Vec::with_capacity(w as usize * h as usize * 4);
        for y in y0..y0 + h {
            let start = self.index(x0, y);
            data.extend_from_slice(&self.data[start..start + w as usize * 4]);
        }

        PixelBuffer { data, width: w, height: h }
    }

    /// Resize by `factor` with a Lanczos filter; a factor of 1.0 returns a copy
    pub fn scale(&self, factor: f64) -> PixelBuffer {
        if (factor - 1.0).abs() < f64::EPSILON || self.width == 0 || self.height == 0 {
            return self.clone();
        }

        let new_width = ((self.width as f64 * factor).round() as u32).max(1);
        let new_height = ((self.height as f64 * factor).round() as u32).max(1);
        debug!(
            "Scaling {}x{} -> {}x{}",
            self.width, self.height, new_width, new_height
        );

        let img = self.to_rgba_image();
        let resized = image::imageops::resize(&img, new_width, new_height, FilterType::Lanczos3);
        PixelBuffer::from(resized)
    }

    fn to_rgba_image(&self) -> RgbaImage {
        // Dimensions are validated on construction
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    /// Convert into an `image` crate value for encoders and OCR backends
    pub fn to_dynamic_image(&self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.to_rgba_image())
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
        }
    }
}

impl From<DynamicImage> for PixelBuffer {
    fn from(img: DynamicImage) -> Self {
        Self::from(img.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        let result = PixelBuffer::from_raw(vec![0; 10], 2, 2);
        match result {
            Err(OcrError::InvalidBuffer { expected, actual }) => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 10);
            }
            other => panic!("Expected InvalidBuffer, got {:?}", other),
        }
    }

    #[test]
    fn test_luminance_weights() {
        // 0.299 * 255 = 76.245
        assert!((luminance(255, 0, 0) - 76.245).abs() < 0.01);
        assert!((luminance(255, 255, 255) - 255.0).abs() < 0.01);
    }

    #[test]
    fn test_crop_copies_rectangle() {
        let mut buf = PixelBuffer::filled(4, 4, [255, 255, 255]);
        buf.set_rgb(2, 1, 0);

        let cropped = buf.crop(Rect { x: 1, y: 1, width: 2, height: 2 });
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(cropped.pixel(1, 0), [0, 0, 0, 255]);
        assert_eq!(cropped.pixel(0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let buf = PixelBuffer::filled(4, 4, [0, 0, 0]);
        let cropped = buf.crop(Rect { x: 3, y: 2, width: 10, height: 10 });
        assert_eq!(cropped.dimensions(), (1, 2));
        assert_eq!(cropped.as_bytes().len(), 8);
    }

    #[test]
    fn test_scale_rounds_dimensions() {
        let buf = PixelBuffer::filled(10, 4, [128, 128, 128]);
        let scaled = buf.scale(2.5);
        assert_eq!(scaled.dimensions(), (25, 10));
        assert_eq!(scaled.as_bytes().len(), 25 * 10 * 4);
    }

    #[test]
    fn test_scale_noop() {
        let buf = PixelBuffer::filled(3, 3, [10, 20, 30]);
        assert_eq!(buf.scale(1.0), buf);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = PixelBuffer::decode(b"definitely not an image");
        assert!(matches!(result, Err(OcrError::Decode(_))));
    }

    #[test]
    fn test_dynamic_image_roundtrip_keeps_pixels() {
        let mut buf = PixelBuffer::filled(3, 2, [200, 100, 50]);
        buf.set_rgb(1, 1, 7);
        let back = PixelBuffer::from(buf.to_dynamic_image());
        assert_eq!(back, buf);
    }
}
