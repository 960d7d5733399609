//! Error types for the OCR pipeline
//!
//! Pixel transforms never fail on a well-formed buffer; only decoding,
//! recognition, and configuration surface errors to the caller.

use thiserror::Error;

/// Errors surfaced by the pipeline
#[derive(Debug, Error)]
pub enum OcrError {
    /// Supplied bytes could not be interpreted as an image
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The recognition engine reported an error
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// The recognition engine ran but produced no usable text
    #[error("no text recognized")]
    NoText,

    /// Raw pixel data does not match the declared dimensions
    #[error("pixel buffer length mismatch: expected {expected} bytes, got {actual}")]
    InvalidBuffer { expected: usize, actual: usize },

    /// Selection rectangle is out of range or collapses to nothing
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// Configuration values are out of range
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, OcrError>;
