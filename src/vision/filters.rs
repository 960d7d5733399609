//! Sharpening and speckle suppression for grayscale page images
//!
//! Both filters read the red channel as the pixel intensity; they are meant
//! to run after [`super::enhance::enhance`], which writes R = G = B.

use super::buffer::PixelBuffer;

/// 3x3 high-boost kernel, row-major
const SHARPEN_KERNEL: [i32; 9] = [-1, -1, -1, -1, 9, -1, -1, -1, -1];

/// Neighbourhood deviation above which a pixel counts as noise
const NOISE_DEVIATION: f32 = 60.0;

/// Convolve interior pixels with the sharpening kernel
///
/// The one-pixel frame is copied from the source unchanged; alpha is
/// forced opaque everywhere.
pub fn sharpen(buffer: &PixelBuffer) -> PixelBuffer {
    let (width, height) = buffer.dimensions();
    let src = buffer.as_bytes();
    let mut out = buffer.clone();

    {
        let dst = out.as_bytes_mut();
        for px in dst.chunks_exact_mut(4) {
            px[3] = 255;
        }
    }

    if width < 3 || height < 3 {
        return out;
    }

    let w = width as usize;
    let dst = out.as_bytes_mut();
    for y in 1..(height as usize - 1) {
        for x in 1..(w - 1) {
            let mut sum = 0i32;
            for ky in 0..3 {
                for kx in 0..3 {
                    let idx = ((y + ky - 1) * w + (x + kx - 1)) * 4;
                    sum += src[idx] as i32 * SHARPEN_KERNEL[ky * 3 + kx];
                }
            }

            let value = sum.clamp(0, 255) as u8;
            let idx = (y * w + x) * 4;
            dst[idx] = value;
            dst[idx + 1] = value;
            dst[idx + 2] = value;
        }
    }

    out
}

/// Pull isolated outliers halfway toward their neighbourhood mean
///
/// Works in place in a single top-to-bottom scan, so a pixel sees the
/// already-smoothed values of the neighbours above and to its left.
/// Border pixels are left untouched.
pub fn denoise(buffer: &mut PixelBuffer) {
    let (width, height) = buffer.dimensions();
    if width < 3 || height < 3 {
        return;
    }

    let w = width as usize;
    let data = buffer.as_bytes_mut();
    for y in 1..(height as usize - 1) {
        for x in 1..(w - 1) {
            let idx = (y * w + x) * 4;
            let current = data[idx] as f32;

            let mut total = 0u32;
            for dy in 0..3 {
                for dx in 0..3 {
                    if dx == 1 && dy == 1 {
                        continue;
                    }
                    total += data[((y + dy - 1) * w + (x + dx - 1)) * 4] as u32;
                }
            }
            let mean = total as f32 / 8.0;

            if (current - mean).abs() > NOISE_DEVIATION {
                let smoothed = ((current + mean) / 2.0).round().clamp(0.0, 255.0) as u8;
                data[idx] = smoothed;
                data[idx + 1] = smoothed;
                data[idx + 2] = smoothed;
            }
        }
    }
}
