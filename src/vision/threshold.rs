//! Automatic black/white reduction using Otsu's method

use tracing::debug;

use super::buffer::PixelBuffer;

#[inline]
fn bucket(gray: f32) -> usize {
    gray.floor().clamp(0.0, 255.0) as usize
}

/// 256-bucket luminance histogram
pub fn histogram(gray: &[f32]) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for &g in gray {
        hist[bucket(g)] += 1;
    }
    hist
}

/// Otsu threshold over a histogram
///
/// Candidate `t` splits the histogram into buckets `[0, t)` and `[t, 255]`.
/// Candidates are scanned left to right and the first one reaching the
/// maximum between-class variance wins. Candidates leaving either class
/// empty are skipped, so an empty or single-valued histogram yields 0.
pub fn otsu_threshold(hist: &[u64; 256]) -> u8 {
    let total: u64 = hist.iter().sum();
    let sum: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_b = 0.0f64;
    let mut weight_b = 0u64;
    let mut max_variance = 0.0f64;
    let mut threshold = 0u8;

    for t in 1..256usize {
        let count = hist[t - 1];
        weight_b += count;
        sum_b += (t - 1) as f64 * count as f64;
        if weight_b == 0 {
            continue;
        }
        let weight_f = total - weight_b;
        if weight_f == 0 {
            break;
        }

        let mean_b = sum_b / weight_b as f64;
        let mean_f = (sum - sum_b) / weight_f as f64;

        let variance = weight_b as f64 * weight_f as f64 * (mean_b - mean_f).powi(2);
        if variance > max_variance {
            max_variance = variance;
            threshold = t as u8;
        }
    }

    threshold
}

/// Binarize a buffer with the Otsu threshold
///
/// A pixel is white when its histogram bucket falls in the upper class
/// `[t, 255]`. A degenerate threshold of 0 keeps pure black black.
pub fn binarize(buffer: &PixelBuffer) -> PixelBuffer {
    let gray = buffer.grayscale_grid();
    let threshold = otsu_threshold(&histogram(&gray));
    debug!("Otsu threshold: {}", threshold);

    let mut out = buffer.clone();
    for (px, &g) in out.as_bytes_mut().chunks_exact_mut(4).zip(gray.iter()) {
        let white = if threshold == 0 {
            bucket(g) > 0
        } else {
            bucket(g) >= threshold as usize
        };
        let value = if white { 255 } else { 0 };
        px[0] = value;
        px[1] = value;
        px[2] = value;
        px[3] = 255;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cluster(low: usize, low_count: u64, high: usize, high_count: u64) -> [u64; 256] {
        let mut hist = [0u64; 256];
        hist[low] = low_count;
        hist[high] = high_count;
        hist
    }

    #[test]
    fn test_otsu_two_equal_clusters() {
        let t = otsu_threshold(&two_cluster(20, 500, 230, 500));
        assert!(t > 20 && t < 230, "threshold {} should separate clusters", t);
        // Between-class variance is flat across the gap; first maximum wins
        assert_eq!(t, 21);
    }

    #[test]
    fn test_otsu_unequal_clusters_still_separate() {
        let t = otsu_threshold(&two_cluster(20, 900, 230, 100));
        assert_eq!(t, 21);
    }

    /// Two overlapping triangular clusters peaking at 80 and 170
    fn overlapping(low_weight: u64, high_weight: u64) -> [u64; 256] {
        let mut hist = [0u64; 256];
        for (i, count) in hist.iter_mut().enumerate() {
            let i = i as i64;
            let low = (60 - (i - 80).abs()).max(0) as u64;
            let high = (60 - (i - 170).abs()).max(0) as u64;
            *count = low_weight * low + high_weight * high;
        }
        hist
    }

    #[test]
    fn test_otsu_shifts_with_cluster_weight() {
        assert_eq!(otsu_threshold(&overlapping(1, 1)), 125);
        // A heavier dark cluster pulls the cut down, a heavier light one up
        assert_eq!(otsu_threshold(&overlapping(9, 1)), 106);
        assert_eq!(otsu_threshold(&overlapping(1, 9)), 145);
    }

    #[test]
    fn test_otsu_spread_clusters_split_between() {
        let mut hist = [0u64; 256];
        for i in 15..=25 {
            hist[i] = 50;
        }
        for i in 225..=235 {
            hist[i] = 50;
        }
        let t = otsu_threshold(&hist);
        assert!((25..225).contains(&(t as usize)), "got {}", t);
    }

    #[test]
    fn test_otsu_degenerate_histograms() {
        assert_eq!(otsu_threshold(&[0u64; 256]), 0);

        let mut single = [0u64; 256];
        single[137] = 1000;
        assert_eq!(otsu_threshold(&single), 0);
    }

    #[test]
    fn test_binarize_output_is_bimodal() {
        let mut data = Vec::new();
        for i in 0..64u32 {
            let v = (i * 4) as u8;
            data.extend_from_slice(&[v, v / 2, 255 - v, 17]);
        }
        let buf = PixelBuffer::from_raw(data, 8, 8).unwrap();
        let out = binarize(&buf);

        assert_eq!(out.dimensions(), (8, 8));
        for px in out.as_bytes().chunks_exact(4) {
            assert!(px[0] == 0 || px[0] == 255);
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_binarize_keeps_adjacent_levels_apart() {
        let mut buf = PixelBuffer::filled(10, 10, [100, 100, 100]);
        for y in 5..10 {
            for x in 0..10 {
                buf.set_rgb(x, y, 101);
            }
        }
        let out = binarize(&buf);

        let white = out.as_bytes().chunks_exact(4).filter(|px| px[0] == 255).count();
        assert_eq!(white, 50);
        assert_eq!(out.pixel(3, 2), [0, 0, 0, 255]);
        assert_eq!(out.pixel(3, 7), [255, 255, 255, 255]);
    }

    #[test]
    fn test_binarize_is_idempotent() {
        let mut buf = PixelBuffer::filled(10, 10, [220, 220, 220]);
        for x in 2..8 {
            buf.set_rgb(x, 5, 30);
            buf.set_rgb(x, 6, 60);
        }
        let once = binarize(&buf);
        let twice = binarize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_binarize_uniform_image_is_stable() {
        let white = PixelBuffer::filled(4, 4, [255, 255, 255]);
        assert_eq!(binarize(&white), white);

        let black = PixelBuffer::filled(4, 4, [0, 0, 0]);
        assert_eq!(binarize(&black), black);
    }
}
