//! Region-based recognition orchestration
//!
//! A run goes through these steps:
//!
//! 1. Select: crop to the configured selection, if any.
//! 2. Standard path: preprocess the whole selection and recognize it once.
//! 3. Region path: segment a contrast-enhanced copy into grid cells, then
//!    preprocess and recognize each cell in order.
//! 4. Fuse: order region results spatially and merge them.
//!
//! The region path never returns a partial answer. If segmentation finds
//! nothing, a region fails, or all regions come back blank, the whole
//! selection is retried on the standard path.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::fusion::{fuse, CombinedResult, RegionResult};
use super::options::{engine_options, RecognitionOptions};
use super::{NoProgress, ProgressPhase, ProgressSink, Recognizer};
use crate::config::PipelineConfig;
use crate::error::{OcrError, Result};
use crate::vision::{detection_image, preprocess, segment, PixelBuffer, StageFlags};

/// Drives preprocessing and recognition for one configuration
pub struct RegionOcrCoordinator<R> {
    recognizer: R,
    config: PipelineConfig,
    extra_variables: BTreeMap<String, String>,
    progress: Arc<dyn ProgressSink>,
}

impl<R: Recognizer> RegionOcrCoordinator<R> {
    /// Create a coordinator, validating the configuration
    pub fn new(recognizer: R, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            recognizer,
            config,
            extra_variables: BTreeMap::new(),
            progress: Arc::new(NoProgress),
        })
    }

    /// Forward progress updates to `sink`
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// Engine variables applied on top of the per-mode option table
    pub fn with_extra_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.extra_variables = variables;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    fn options(&self) -> RecognitionOptions {
        engine_options(self.config.effective_language(), self.config.mode)
            .with_overrides(&self.extra_variables)
    }

    /// Crop to the configured selection, or copy the whole image
    pub fn select(&self, image: &PixelBuffer) -> Result<PixelBuffer> {
        match &self.config.selection {
            Some(selection) => {
                let rect = selection.to_rect(image.width(), image.height())?;
                debug!("Selected {:?} of {}x{} image", rect, image.width(), image.height());
                Ok(image.crop(rect))
            }
            None => Ok(image.clone()),
        }
    }

    /// Recognize `image` using the configured path
    pub async fn run(&self, image: &PixelBuffer) -> Result<CombinedResult> {
        let selected = self.select(image)?;

        let result = if self.config.region_based {
            match self.run_regions(&selected).await {
                Some(result) => result,
                None => self.run_standard(&selected).await?,
            }
        } else {
            self.run_standard(&selected).await?
        };

        self.progress.on_progress(ProgressPhase::Done, 1.0);
        Ok(result)
    }

    /// Preprocess and recognize the selection as a single image
    pub async fn run_standard(&self, selected: &PixelBuffer) -> Result<CombinedResult> {
        let language = self.config.effective_language();
        info!(
            "Standard recognition of {}x{} image (language: {}, mode: {:?})",
            selected.width(),
            selected.height(),
            language,
            self.config.mode
        );

        let processed = preprocess(
            selected,
            self.config.scale_factor,
            StageFlags::from_config(&self.config),
        );

        self.progress.on_progress(ProgressPhase::RecognizingPage, 0.2);
        let output = self
            .recognizer
            .recognize(&processed, language, &self.options())
            .await?;

        if output.text.trim().is_empty() {
            return Err(OcrError::NoText);
        }

        Ok(CombinedResult {
            text: output.text,
            confidence: output.confidence.unwrap_or(0.0),
        })
    }

    /// Recognize each content region; `None` means fall back to the
    /// standard path
    async fn run_regions(&self, selected: &PixelBuffer) -> Option<CombinedResult> {
        self.progress.on_progress(ProgressPhase::Analyzing, 0.1);

        let detection = detection_image(selected, &self.config);
        let regions = segment(&detection, self.config.grid_rows, self.config.grid_cols);
        info!("Detected {} content regions", regions.len());

        if regions.is_empty() {
            info!("No content regions found, falling back to standard recognition");
            return None;
        }

        let language = self.config.effective_language();
        let options = self.options();
        let flags = StageFlags::from_config(&self.config);
        let total = regions.len();
        let mut results = Vec::with_capacity(total);

        for (index, region) in regions.into_iter().enumerate() {
            self.progress.on_progress(
                ProgressPhase::Recognizing { index, total },
                0.2 + (index as f32 / total as f32) * 0.8,
            );
            debug!(
                "Region {}/{} at row {}, col {} ({}x{})",
                index + 1,
                total,
                region.row,
                region.col,
                region.width,
                region.height
            );

            let cell = selected.crop(region.rect());
            let processed = preprocess(&cell, self.config.scale_factor, flags);

            match self.recognizer.recognize(&processed, language, &options).await {
                Ok(output) => results.push(RegionResult {
                    region,
                    text: output.text.trim().to_string(),
                    confidence: output.confidence,
                }),
                Err(e) => {
                    warn!(
                        "Region ({}, {}) failed, falling back to standard recognition: {}",
                        region.row, region.col, e
                    );
                    return None;
                }
            }
        }

        let combined = fuse(results);
        if combined.text.is_empty() {
            warn!("All regions came back blank, falling back to standard recognition");
            return None;
        }
        Some(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OcrMode, Selection};
    use crate::ocr::RecognitionOutput;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        width: u32,
        height: u32,
        language: String,
        page_seg_mode: u8,
    }

    /// Replays scripted outputs, then answers with an image fingerprint
    #[derive(Default)]
    struct MockRecognizer {
        script: Mutex<VecDeque<Result<RecognitionOutput>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl MockRecognizer {
        fn scripted(outputs: Vec<Result<RecognitionOutput>>) -> Self {
            Self {
                script: Mutex::new(outputs.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn output(text: &str, confidence: f64) -> Result<RecognitionOutput> {
        Ok(RecognitionOutput {
            text: text.to_string(),
            confidence: Some(confidence),
        })
    }

    #[async_trait]
    impl Recognizer for MockRecognizer {
        async fn recognize(
            &self,
            image: &PixelBuffer,
            language: &str,
            options: &RecognitionOptions,
        ) -> Result<RecognitionOutput> {
            self.calls.lock().unwrap().push(Call {
                width: image.width(),
                height: image.height(),
                language: language.to_string(),
                page_seg_mode: options.page_seg_mode,
            });

            if let Some(next) = self.script.lock().unwrap().pop_front() {
                return next;
            }

            let ink = image
                .grayscale_grid()
                .iter()
                .filter(|&&g| g < 128.0)
                .count();
            Ok(RecognitionOutput {
                text: format!("{}x{}:{}", image.width(), image.height(), ink),
                confidence: Some(0.5),
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<(ProgressPhase, f32)>>,
    }

    impl ProgressSink for RecordingSink {
        fn on_progress(&self, phase: ProgressPhase, fraction: f32) {
            self.events.lock().unwrap().push((phase, fraction));
        }
    }

    fn page_with_blocks(cells: &[(u32, u32)]) -> PixelBuffer {
        let mut page = PixelBuffer::filled(90, 90, [255, 255, 255]);
        for &(row, col) in cells {
            for y in row * 30 + 10..row * 30 + 20 {
                for x in col * 30 + 10..col * 30 + 20 {
                    page.set_rgb(x, y, 0);
                }
            }
        }
        page
    }

    fn region_config() -> PipelineConfig {
        PipelineConfig {
            region_based: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_standard_path_single_call() {
        let coordinator = RegionOcrCoordinator::new(
            MockRecognizer::scripted(vec![output("hello", 0.9)]),
            PipelineConfig::default(),
        )
        .unwrap();

        let page = PixelBuffer::filled(40, 20, [255, 255, 255]);
        let result = coordinator.run(&page).await.unwrap();

        assert_eq!(result.text, "hello");
        assert!((result.confidence - 0.9).abs() < 1e-9);
        assert_eq!(
            coordinator.recognizer().calls(),
            vec![Call {
                width: 100,
                height: 50,
                language: "eng".to_string(),
                page_seg_mode: 3,
            }]
        );
    }

    #[tokio::test]
    async fn test_region_path_fuses_in_spatial_order() {
        let coordinator = RegionOcrCoordinator::new(
            MockRecognizer::scripted(vec![
                output("A", 0.6),
                output("B", 0.8),
                output("C", 0.7),
            ]),
            region_config(),
        )
        .unwrap();

        let page = page_with_blocks(&[(0, 0), (0, 2), (2, 1)]);
        let result = coordinator.run(&page).await.unwrap();

        assert_eq!(result.text, "A\tB\nC");
        assert!((result.confidence - 0.7).abs() < 1e-9);

        let calls = coordinator.recognizer().calls();
        assert_eq!(calls.len(), 3);
        for call in calls {
            assert_eq!((call.width, call.height), (75, 75));
        }
    }

    #[tokio::test]
    async fn test_empty_segmentation_matches_standard_path() {
        let page = PixelBuffer::filled(90, 60, [250, 250, 250]);

        let regional = RegionOcrCoordinator::new(MockRecognizer::default(), region_config()).unwrap();
        let standard =
            RegionOcrCoordinator::new(MockRecognizer::default(), PipelineConfig::default()).unwrap();

        let from_regions = regional.run(&page).await.unwrap();
        let direct = standard.run_standard(&page).await.unwrap();

        assert_eq!(from_regions, direct);
        assert_eq!(regional.recognizer().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_region_failure_falls_back_to_whole_image() {
        let coordinator = RegionOcrCoordinator::new(
            MockRecognizer::scripted(vec![
                output("A", 0.6),
                Err(OcrError::Recognition("engine crashed".to_string())),
            ]),
            region_config(),
        )
        .unwrap();

        let page = page_with_blocks(&[(0, 0), (1, 1), (2, 2)]);
        let result = coordinator.run(&page).await.unwrap();

        let calls = coordinator.recognizer().calls();
        assert_eq!(calls.len(), 3);
        // Last call is the whole 90x90 page at 2.5x
        assert_eq!((calls[2].width, calls[2].height), (225, 225));
        assert!(result.text.starts_with("225x225:"));
        assert!((result.confidence - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_blank_regions_fall_back() {
        let coordinator = RegionOcrCoordinator::new(
            MockRecognizer::scripted(vec![output("  ", 0.9), output("page", 0.4)]),
            region_config(),
        )
        .unwrap();

        let page = page_with_blocks(&[(1, 1)]);
        let result = coordinator.run(&page).await.unwrap();
        assert_eq!(result.text, "page");
        assert_eq!(coordinator.recognizer().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_standard_failure_is_surfaced() {
        let coordinator = RegionOcrCoordinator::new(
            MockRecognizer::scripted(vec![Err(OcrError::Recognition("boom".to_string()))]),
            PipelineConfig::default(),
        )
        .unwrap();

        let page = PixelBuffer::filled(10, 10, [255, 255, 255]);
        let result = coordinator.run(&page).await;
        assert!(matches!(result, Err(OcrError::Recognition(_))));
    }

    #[tokio::test]
    async fn test_standard_empty_text_is_no_text() {
        let coordinator = RegionOcrCoordinator::new(
            MockRecognizer::scripted(vec![output(" \n", 0.2)]),
            PipelineConfig::default(),
        )
        .unwrap();

        let page = PixelBuffer::filled(10, 10, [255, 255, 255]);
        assert!(matches!(coordinator.run(&page).await, Err(OcrError::NoText)));
    }

    #[tokio::test]
    async fn test_selection_is_cropped_before_processing() {
        let config = PipelineConfig {
            selection: Some(Selection { x: 0.5, y: 0.0, width: 0.5, height: 0.5 }),
            scale_factor: 1.0,
            ..Default::default()
        };
        let coordinator = RegionOcrCoordinator::new(MockRecognizer::default(), config).unwrap();

        let page = PixelBuffer::filled(80, 40, [255, 255, 255]);
        let result = coordinator.run(&page).await.unwrap();

        assert_eq!(result.text, "40x20:0");
    }

    #[tokio::test]
    async fn test_invalid_selection_is_error() {
        let config = PipelineConfig {
            selection: Some(Selection { x: 1.5, y: 0.0, width: 0.5, height: 0.5 }),
            ..Default::default()
        };
        let coordinator = RegionOcrCoordinator::new(MockRecognizer::default(), config).unwrap();

        let page = PixelBuffer::filled(8, 8, [255, 255, 255]);
        assert!(matches!(
            coordinator.run(&page).await,
            Err(OcrError::InvalidSelection(_))
        ));
        assert!(coordinator.recognizer().calls().is_empty());
    }

    #[tokio::test]
    async fn test_form_mode_uses_fixed_language() {
        let config = PipelineConfig {
            mode: OcrMode::Form,
            language: "eng".to_string(),
            ..Default::default()
        };
        let coordinator = RegionOcrCoordinator::new(MockRecognizer::default(), config).unwrap();

        let page = PixelBuffer::filled(8, 8, [255, 255, 255]);
        coordinator.run(&page).await.unwrap();

        let calls = coordinator.recognizer().calls();
        assert_eq!(calls[0].language, "chi_tra+eng");
        assert_eq!(calls[0].page_seg_mode, 6);
    }

    #[tokio::test]
    async fn test_progress_is_reported_per_region() {
        let sink = Arc::new(RecordingSink::default());
        let coordinator = RegionOcrCoordinator::new(MockRecognizer::default(), region_config())
            .unwrap()
            .with_progress(sink.clone());

        let page = page_with_blocks(&[(0, 1), (2, 0)]);
        coordinator.run(&page).await.unwrap();

        let events = sink.events.lock().unwrap().clone();
        let phases: Vec<ProgressPhase> = events.iter().map(|(p, _)| *p).collect();
        assert_eq!(
            phases,
            vec![
                ProgressPhase::Analyzing,
                ProgressPhase::Recognizing { index: 0, total: 2 },
                ProgressPhase::Recognizing { index: 1, total: 2 },
                ProgressPhase::Done,
            ]
        );
        assert!((events[2].1 - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            grid_rows: 0,
            ..Default::default()
        };
        assert!(RegionOcrCoordinator::new(MockRecognizer::default(), config).is_err());
    }
}
