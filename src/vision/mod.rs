//! Vision Layer
//!
//! Pixel-level preparation of document photos for recognition:
//! - Grayscale + gamma/contrast enhancement
//! - Otsu binarization
//! - Sharpening and speckle suppression
//! - Table ruling and circle-frame removal
//! - Grid segmentation into recognizable regions
//!
//! Every transform is a plain function over an explicitly passed
//! [`PixelBuffer`]; nothing is cached between calls.

pub mod buffer;
pub mod circles;
pub mod enhance;
pub mod filters;
pub mod lines;
pub mod preprocess;
pub mod segment;
pub mod threshold;

pub use buffer::{luminance, PixelBuffer, Rect};
pub use circles::{detect_circles, remove_circle_frames, remove_circles, CircleFrame};
pub use enhance::{detect_inverted_text, enhance, enhance_with_inversion};
pub use filters::{denoise, sharpen};
pub use lines::{detect_horizontal, detect_vertical, remove_lines, remove_table_lines, Axis, LineSegment};
pub use preprocess::{detection_image, preprocess, StageFlags};
pub use segment::{segment, Region};
pub use threshold::{binarize, histogram, otsu_threshold};
