//! Recognition Layer
//!
//! The recognition engine itself is external; this module defines the seam
//! it plugs into and the orchestration around it:
//! - [`Recognizer`]: the engine capability
//! - [`RegionOcrCoordinator`]: crop, preprocess, recognize, fuse
//! - [`refine_text`]: mode-specific cleanup of recognized text
//! - [`TesseractRecognizer`]: a backend driving the Tesseract CLI

pub mod coordinator;
pub mod fusion;
pub mod options;
pub mod postprocess;
pub mod tesseract;

use async_trait::async_trait;

use crate::error::Result;
use crate::vision::PixelBuffer;

pub use coordinator::RegionOcrCoordinator;
pub use fusion::{fuse, CombinedResult, RegionResult};
pub use options::{engine_options, RecognitionOptions};
pub use postprocess::refine_text;
pub use tesseract::TesseractRecognizer;

/// Text and self-assessed confidence returned by an engine
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOutput {
    pub text: String,
    /// Confidence in [0, 1], if the engine reports one
    pub confidence: Option<f64>,
}

/// A character-recognition engine
///
/// Calls are awaited one at a time; implementations may assume
/// single-flight use.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize the text in `image`
    async fn recognize(
        &self,
        image: &PixelBuffer,
        language: &str,
        options: &RecognitionOptions,
    ) -> Result<RecognitionOutput>;
}

/// Pipeline phase reported to a progress observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Looking for content regions
    Analyzing,
    /// Recognizing region `index` (0-based) of `total`
    Recognizing { index: usize, total: usize },
    /// Whole-image recognition
    RecognizingPage,
    /// Finished
    Done,
}

/// Observer for pipeline progress
pub trait ProgressSink: Send + Sync {
    /// `fraction` is the overall completion in [0, 1]
    fn on_progress(&self, phase: ProgressPhase, fraction: f32);
}

/// Sink that ignores every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _phase: ProgressPhase, _fraction: f32) {}
}
