//! docscan-ocr - Document image preprocessing and region-based OCR
//!
//! Cleans up scanned or photographed documents (contrast, binarization,
//! sharpening, table-line and circle-frame removal) and recognizes their
//! text either as one page or cell by cell on a content grid.

pub mod config;
pub mod error;
pub mod ocr;
pub mod vision;

pub use config::{AppConfig, OcrMode, PipelineConfig, RecognitionPreset, Selection};
pub use error::{OcrError, Result};
pub use ocr::{
    refine_text, CombinedResult, ProgressPhase, ProgressSink, RecognitionOptions,
    RecognitionOutput, Recognizer, RegionOcrCoordinator, TesseractRecognizer,
};
pub use vision::PixelBuffer;
