//! docscan-ocr - Recognize text in document photos
//!
//! Command line front end: decodes an image, runs the preprocessing and
//! recognition pipeline with the Tesseract backend, and prints the text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use docscan_ocr::config::{self, AppConfig, OcrMode, RecognitionPreset, Selection};
use docscan_ocr::ocr::{refine_text, ProgressPhase, ProgressSink, RegionOcrCoordinator};
use docscan_ocr::{OcrError, PixelBuffer, TesseractRecognizer};

/// docscan-ocr - Document preprocessing and region-based OCR
#[derive(Parser, Debug)]
#[command(name = "docscan-ocr")]
#[command(about = "Clean up document photos and recognize their text")]
struct Args {
    /// Image file to recognize
    image: PathBuf,

    /// Configuration file (defaults to the per-user config.toml, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// One-click preset for a common document type
    #[arg(short, long, value_enum)]
    preset: Option<RecognitionPreset>,

    /// Tesseract language, e.g. "eng" or "chi_tra+eng"
    #[arg(short, long)]
    lang: Option<String>,

    /// Processing mode
    #[arg(short, long, value_enum)]
    mode: Option<OcrMode>,

    /// Skip contrast, sharpening and cleanup stages
    #[arg(long)]
    basic: bool,

    /// Binarize with an Otsu threshold instead of contrast enhancement
    #[arg(long)]
    binary: bool,

    /// Erase table rulings before recognition
    #[arg(long)]
    remove_lines: bool,

    /// Erase ring frames around circled glyphs
    #[arg(long)]
    remove_circles: bool,

    /// Flip light-on-dark text before enhancement
    #[arg(long)]
    invert: bool,

    /// Recognize grid regions separately and merge the results
    #[arg(long)]
    regions: bool,

    /// Grid size for region recognition, as ROWSxCOLS
    #[arg(long, value_parser = parse_grid)]
    grid: Option<(u32, u32)>,

    /// Upscaling factor applied before enhancement
    #[arg(long)]
    scale: Option<f64>,

    /// Sub-area to process, as normalized fractions "x,y,width,height"
    #[arg(long, value_parser = parse_selection)]
    select: Option<Selection>,

    /// Print the engine output without text cleanup
    #[arg(long)]
    raw: bool,

    /// Write the effective settings to the config file and exit
    #[arg(long)]
    save_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_selection(value: &str) -> std::result::Result<Selection, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("{:?}: {}", p, e)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    match parts.as_slice() {
        [x, y, width, height] => Ok(Selection {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        }),
        _ => Err(format!("expected 4 comma-separated values, got {}", parts.len())),
    }
}

fn parse_grid(value: &str) -> std::result::Result<(u32, u32), String> {
    let (rows, cols) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected ROWSxCOLS, got {:?}", value))?;
    let rows = rows.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let cols = cols.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok((rows, cols))
}

/// Forwards pipeline progress to the log
struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_progress(&self, phase: ProgressPhase, fraction: f32) {
        debug!("{:?} ({:.0}%)", phase, fraction * 100.0);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => config::default_config_path().ok(),
    };

    let mut app_config = load_or_default_config(config_path.as_deref(), args.config.is_some())?;
    apply_overrides(&mut app_config, &args);

    if args.save_config {
        let path = config_path.context("Could not determine config file location")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        config::save_config(&app_config, &path)?;
        info!("Saved configuration to {:?}", path);
        return Ok(());
    }

    if !TesseractRecognizer::is_available() {
        bail!("tesseract was not found; install it and make sure it is on PATH");
    }

    let image = PixelBuffer::open(&args.image)
        .with_context(|| format!("Failed to load image: {:?}", args.image))?;
    info!(
        "Loaded {:?} ({}x{})",
        args.image,
        image.width(),
        image.height()
    );

    let mode = app_config.pipeline.mode;
    let coordinator = RegionOcrCoordinator::new(TesseractRecognizer::new(), app_config.pipeline)?
        .with_extra_variables(app_config.tesseract.extra_variables)
        .with_progress(Arc::new(LogProgress));

    let result = match coordinator.run(&image).await {
        Ok(result) => result,
        Err(OcrError::NoText) => {
            println!("no text recognized");
            return Ok(());
        }
        Err(e) => return Err(e).context("Recognition failed"),
    };

    let text = if args.raw {
        result.text
    } else {
        refine_text(&result.text, mode)
    };

    if text.trim().is_empty() {
        println!("no text recognized");
    } else {
        println!("{}", text);
    }
    info!("Confidence: {:.1}%", result.confidence * 100.0);

    Ok(())
}

/// Load configuration from file, falling back to defaults
///
/// A missing file is only an error when the path was given explicitly.
fn load_or_default_config(path: Option<&Path>, explicit: bool) -> Result<AppConfig> {
    match path {
        Some(path) if path.exists() => {
            let config = config::load_config(path)?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        }
        Some(path) if explicit => bail!("Config file not found: {:?}", path),
        _ => {
            debug!("Using default configuration");
            Ok(AppConfig::default())
        }
    }
}

/// Layer command line flags over the loaded configuration
fn apply_overrides(app_config: &mut AppConfig, args: &Args) {
    let pipeline = &mut app_config.pipeline;

    if let Some(preset) = args.preset {
        preset.apply(pipeline);
    }
    if let Some(lang) = &args.lang {
        pipeline.language = lang.clone();
    }
    if let Some(mode) = args.mode {
        pipeline.mode = mode;
    }
    if args.basic {
        pipeline.advanced_mode = false;
    }
    if args.binary {
        pipeline.binary_mode = true;
    }
    if args.remove_lines {
        pipeline.remove_table_lines = true;
    }
    if args.remove_circles {
        pipeline.remove_circle_frames = true;
    }
    if args.invert {
        pipeline.invert_light_text = true;
    }
    if args.regions {
        pipeline.region_based = true;
    }
    if let Some((rows, cols)) = args.grid {
        pipeline.grid_rows = rows;
        pipeline.grid_cols = cols;
    }
    if let Some(scale) = args.scale {
        pipeline.scale_factor = scale;
    }
    if let Some(selection) = args.select {
        pipeline.selection = Some(selection);
    }

    if pipeline.mode != OcrMode::Text && pipeline.language != config::FORM_LANGUAGE {
        warn!(
            "{:?} mode always recognizes with {}, ignoring language {:?}",
            pipeline.mode,
            config::FORM_LANGUAGE,
            pipeline.language
        );
    }
}
