//! Recognizer backed by the system Tesseract installation

use std::collections::HashMap;

use async_trait::async_trait;
use rusty_tesseract::{Args, Image};
use tracing::{debug, warn};

use super::{RecognitionOptions, RecognitionOutput, Recognizer};
use crate::error::{OcrError, Result};
use crate::vision::PixelBuffer;

/// Drives the `tesseract` binary through rusty-tesseract
///
/// Each call writes the image to a temporary file and shells out, so the
/// work runs on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct TesseractRecognizer;

impl TesseractRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Whether a `tesseract` binary can be found
    pub fn is_available() -> bool {
        match rusty_tesseract::get_tesseract_version() {
            Ok(version) => {
                debug!("Found tesseract {}", version.trim());
                true
            }
            Err(e) => {
                debug!("tesseract not available: {}", e);
                false
            }
        }
    }
}

fn build_args(language: &str, options: &RecognitionOptions) -> Args {
    let config_variables: HashMap<String, String> = options
        .variables
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Args {
        lang: language.to_string(),
        config_variables,
        dpi: Some(options.dpi as i32),
        psm: Some(i32::from(options.page_seg_mode)),
        oem: Some(i32::from(options.engine_mode)),
    }
}

/// Mean of the positive word confidences, scaled to [0, 1]
fn mean_word_confidence<'a>(words: impl IntoIterator<Item = (&'a str, f32)>) -> Option<f64> {
    let confidences: Vec<f64> = words
        .into_iter()
        .filter(|(text, conf)| !text.trim().is_empty() && *conf > 0.0)
        .map(|(_, conf)| f64::from(conf))
        .collect();

    if confidences.is_empty() {
        return None;
    }
    let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
    Some((mean / 100.0).clamp(0.0, 1.0))
}

fn recognize_blocking(image: PixelBuffer, args: Args) -> Result<RecognitionOutput> {
    let dynamic = image.to_dynamic_image();
    let tess_image = Image::from_dynamic_image(&dynamic)
        .map_err(|e| OcrError::Recognition(format!("failed to prepare image: {}", e)))?;

    let text = rusty_tesseract::image_to_string(&tess_image, &args)
        .map_err(|e| OcrError::Recognition(e.to_string()))?;

    let confidence = match rusty_tesseract::image_to_data(&tess_image, &args) {
        Ok(output) => mean_word_confidence(output.data.iter().map(|d| (d.text.as_str(), d.conf))),
        Err(e) => {
            warn!("Word confidences unavailable: {}", e);
            None
        }
    };

    Ok(RecognitionOutput { text, confidence })
}

#[async_trait]
impl Recognizer for TesseractRecognizer {
    async fn recognize(
        &self,
        image: &PixelBuffer,
        language: &str,
        options: &RecognitionOptions,
    ) -> Result<RecognitionOutput> {
        let args = build_args(language, options);
        debug!(
            "tesseract lang={} psm={:?} on {}x{}",
            args.lang,
            args.psm,
            image.width(),
            image.height()
        );

        let image = image.clone();
        tokio::task::spawn_blocking(move || recognize_blocking(image, args))
            .await
            .map_err(|e| OcrError::Recognition(format!("recognition task failed: {}", e)))?
    }
}
