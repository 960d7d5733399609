//! Ring-shaped frame detection around isolated glyphs
//!
//! Circled digits (common on printed schedules) confuse the recognizer. This
//! samples candidate centers on a coarse grid and tests each radius with a
//! dark-circumference / light-interior probe, then erases only the ring band
//! so the glyph inside survives.

use std::f64::consts::PI;

use tracing::debug;

use super::buffer::PixelBuffer;

const MIN_RADIUS: u32 = 15;
const MAX_RADIUS: u32 = 50;
const RADIUS_STEP: usize = 2;
const CENTER_STRIDE: usize = 3;

const BORDER_SAMPLES: u32 = 16;
const INNER_SAMPLES: u32 = 8;
const INNER_OFFSET: u32 = 8;
const MIN_INNER_RADIUS: u32 = 5;

const BORDER_DARK_LEVEL: f32 = 128.0;
const INNER_LIGHT_LEVEL: f32 = 200.0;
const BORDER_RATIO: f64 = 0.6;
const INNER_RATIO: f64 = 0.5;

/// Half-width of the erased ring band
const RING_HALF_WIDTH: f64 = 3.0;

/// A detected circular frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircleFrame {
    pub center_x: u32,
    pub center_y: u32,
    pub radius: u32,
}

impl CircleFrame {
    fn contains(&self, x: u32, y: u32) -> bool {
        let dx = self.center_x as f64 - x as f64;
        let dy = self.center_y as f64 - y as f64;
        (dx * dx + dy * dy).sqrt() < self.radius as f64
    }
}

/// Count samples on a circle whose luminance satisfies `accept`
fn count_on_circle(
    gray: &[f32],
    width: u32,
    height: u32,
    (cx, cy): (u32, u32),
    radius: u32,
    samples: u32,
    accept: impl Fn(f32) -> bool,
) -> u32 {
    (0..samples)
        .filter(|&i| {
            let angle = 2.0 * PI * i as f64 / samples as f64;
            // Half-up rounding keeps sample positions symmetric around the center
            let x = (cx as f64 + radius as f64 * angle.cos() + 0.5).floor();
            let y = (cy as f64 + radius as f64 * angle.sin() + 0.5).floor();
            if x < 0.0 || y < 0.0 || x >= width as f64 || y >= height as f64 {
                return false;
            }
            accept(gray[y as usize * width as usize + x as usize])
        })
        .count() as u32
}

fn is_ring(gray: &[f32], width: u32, height: u32, center: (u32, u32), radius: u32) -> bool {
    let border = count_on_circle(gray, width, height, center, radius, BORDER_SAMPLES, |g| {
        g < BORDER_DARK_LEVEL
    });

    let inner_radius = radius.saturating_sub(INNER_OFFSET).max(MIN_INNER_RADIUS);
    let inner = count_on_circle(gray, width, height, center, inner_radius, INNER_SAMPLES, |g| {
        g > INNER_LIGHT_LEVEL
    });

    border as f64 / BORDER_SAMPLES as f64 > BORDER_RATIO
        && inner as f64 / INNER_SAMPLES as f64 > INNER_RATIO
}

/// Find ring frames in a row-major luminance grid
pub fn detect_circles(gray: &[f32], width: u32, height: u32) -> Vec<CircleFrame> {
    let mut circles: Vec<CircleFrame> = Vec::new();
    if width <= 2 * MAX_RADIUS || height <= 2 * MAX_RADIUS {
        return circles;
    }

    for cy in (MAX_RADIUS..height - MAX_RADIUS).step_by(CENTER_STRIDE) {
        for cx in (MAX_RADIUS..width - MAX_RADIUS).step_by(CENTER_STRIDE) {
            let hit = (MIN_RADIUS..=MAX_RADIUS)
                .step_by(RADIUS_STEP)
                .find(|&r| is_ring(gray, width, height, (cx, cy), r));

            if let Some(radius) = hit {
                if !circles.iter().any(|c| c.contains(cx, cy)) {
                    debug!("Circle frame at ({}, {}) radius {}", cx, cy, radius);
                    circles.push(CircleFrame {
                        center_x: cx,
                        center_y: cy,
                        radius,
                    });
                }
            }
        }
    }

    circles
}

/// Whiten the band `radius ± 3` around each frame, keeping alpha
pub fn remove_circles(buffer: &mut PixelBuffer, circles: &[CircleFrame]) {
    let (width, height) = buffer.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    for circle in circles {
        let reach = circle.radius + RING_HALF_WIDTH as u32;
        let x0 = circle.center_x.saturating_sub(reach);
        let y0 = circle.center_y.saturating_sub(reach);
        let x1 = (circle.center_x + reach).min(width - 1);
        let y1 = (circle.center_y + reach).min(height - 1);

        let inner = circle.radius as f64 - RING_HALF_WIDTH;
        let outer = circle.radius as f64 + RING_HALF_WIDTH;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 - circle.center_x as f64;
                let dy = y as f64 - circle.center_y as f64;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance >= inner && distance <= outer {
                    buffer.set_rgb(x, y, 255);
                }
            }
        }
    }
}

/// Detect frames on the current image, then erase them; returns the count
pub fn remove_circle_frames(buffer: &mut PixelBuffer) -> usize {
    let (width, height) = buffer.dimensions();
    let gray = buffer.grayscale_grid();
    let circles = detect_circles(&gray, width, height);
    remove_circles(buffer, &circles);
    debug!("Removed {} circle frames", circles.len());
    circles.len()
}
