//! Pipeline Configuration
//!
//! Recognition settings stored in TOML format, plus the one-click presets
//! for common document types.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::vision::Rect;

/// Processing mode, selecting engine options and text cleanup rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OcrMode {
    /// Tables and forms with mixed Chinese/Latin content
    Form,
    /// Dates, times and bare numbers
    #[value(name = "datetime")]
    DateTime,
    /// Running text
    #[default]
    Text,
}

/// Language forced by modes that hide the language choice
pub const FORM_LANGUAGE: &str = "chi_tra+eng";

/// Normalized selection rectangle, fractions of the image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Selection {
    /// Convert to a pixel rectangle inside a `width x height` image
    pub fn to_rect(&self, width: u32, height: u32) -> crate::Result<Rect> {
        let fields = [self.x, self.y, self.width, self.height];
        if fields.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > 1.0) {
            return Err(OcrError::InvalidSelection(format!(
                "components must lie in [0, 1]: {:?}",
                self
            )));
        }

        let x = ((width as f64 * self.x).round() as u32).min(width);
        let y = ((height as f64 * self.y).round() as u32).min(height);
        let w = ((width as f64 * self.width).round() as u32).min(width - x);
        let h = ((height as f64 * self.height).round() as u32).min(height - y);

        if w == 0 || h == 0 {
            return Err(OcrError::InvalidSelection(format!(
                "selection {:?} is empty on a {}x{} image",
                self, width, height
            )));
        }

        Ok(Rect {
            x,
            y,
            width: w,
            height: h,
        })
    }
}

/// Preprocessing and recognition settings for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Enable the enhancement stages (contrast, sharpen, denoise, cleanup)
    pub advanced_mode: bool,
    /// Otsu binarization instead of contrast + sharpen + denoise
    pub binary_mode: bool,
    /// Erase long horizontal/vertical rulings
    pub remove_table_lines: bool,
    /// Erase ring frames around circled glyphs (experimental)
    pub remove_circle_frames: bool,
    /// Flip light-on-dark text before enhancement (experimental)
    pub invert_light_text: bool,
    /// Split the page into grid regions and recognize each separately
    pub region_based: bool,
    /// Upscaling factor applied before enhancement
    pub scale_factor: f64,
    /// Grid rows for region-based recognition
    pub grid_rows: u32,
    /// Grid columns for region-based recognition
    pub grid_cols: u32,
    /// Tesseract language tag, e.g. "eng" or "chi_tra+eng"
    pub language: String,
    /// Processing mode
    pub mode: OcrMode,
    /// Optional sub-area of the image to process
    pub selection: Option<Selection>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            advanced_mode: true,
            binary_mode: false,
            remove_table_lines: false,
            remove_circle_frames: false,
            invert_light_text: false,
            region_based: false,
            scale_factor: 2.5,
            grid_rows: 3,
            grid_cols: 3,
            language: "eng".to_string(),
            mode: OcrMode::Text,
            selection: None,
        }
    }
}

impl PipelineConfig {
    /// Language actually sent to the engine; form and date-time modes are
    /// fixed to Traditional Chinese + English
    pub fn effective_language(&self) -> &str {
        match self.mode {
            OcrMode::Form | OcrMode::DateTime => FORM_LANGUAGE,
            OcrMode::Text => &self.language,
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(OcrError::Config(format!(
                "scale_factor must be positive, got {}",
                self.scale_factor
            )));
        }
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(OcrError::Config(format!(
                "grid must have at least one cell, got {}x{}",
                self.grid_rows, self.grid_cols
            )));
        }
        if self.language.trim().is_empty() {
            return Err(OcrError::Config("language must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Settings for the Tesseract backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractSettings {
    /// Extra engine variables applied on top of the per-mode table
    pub extra_variables: BTreeMap<String, String>,
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pipeline settings
    pub pipeline: PipelineConfig,
    /// Backend settings
    pub tesseract: TesseractSettings,
}

/// Recognition presets matching common document types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionPreset {
    /// Bare numbers, e.g. circled schedule digits
    Numbers,
    /// Traditional Chinese text
    Chinese,
    /// English text
    English,
    /// Dates and times
    Datetime,
    /// Mixed-layout pages, recognized region by region
    Mixed,
}

impl RecognitionPreset {
    /// Overwrite mode, language and stage flags for this preset
    pub fn apply(self, config: &mut PipelineConfig) {
        let (mode, language, region_based) = match self {
            RecognitionPreset::Numbers => (OcrMode::DateTime, "eng", false),
            RecognitionPreset::Chinese => (OcrMode::Text, "chi_tra", false),
            RecognitionPreset::English => (OcrMode::Text, "eng", false),
            RecognitionPreset::Datetime => (OcrMode::DateTime, FORM_LANGUAGE, false),
            RecognitionPreset::Mixed => (OcrMode::Text, FORM_LANGUAGE, true),
        };

        config.mode = mode;
        config.language = language.to_string();
        config.advanced_mode = true;
        config.binary_mode = false;
        config.remove_table_lines = false;
        config.region_based = region_based;
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Default location of `config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "docscan", "DocscanOcr")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
