//! textlens - interactive image-to-text utility
//!
//! Load an image, rotate it until the text is upright, recognize the text
//! and classify it as Russian or English.

mod analysis;
mod config;
mod session;
mod shell;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::analysis::{LanguageDetector, WhatlangDetector};
use crate::config::{AppConfig, OcrBackend};
use crate::session::{Session, SessionOptions};
use crate::shell::{Command, Shell};
use crate::vision::{ModelManager, OcrEngine, TesseractEngine, TesseractOptions, TextRecognizer};

/// textlens - recognize Russian and English text in images
#[derive(Parser, Debug)]
#[command(name = "textlens")]
#[command(about = "Rotate an image, recognize its text and detect the language")]
struct Args {
    /// Configuration file (defaults to config.toml in the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the OCR models
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Image to load on startup
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Print OCR model availability and exit
    #[arg(long)]
    model_status: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    write_config: bool,

    /// Never download missing models
    #[arg(long)]
    offline: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_source, config_error) = load_or_create_config(args.config.as_ref())?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.general.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("textlens starting...");
    if let Some(e) = config_error {
        warn!("Using default configuration: {:#}", e);
    }
    info!("Configuration: {}", config_source);

    if args.write_config {
        let path = match &args.config {
            Some(path) => path.clone(),
            None => storage::get_config_dir()?.join("config.toml"),
        };
        config::save_config(&config, &path)
            .with_context(|| format!("Failed to write config file {:?}", path))?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let models = model_manager(&args, &config)?;

    // Model status mode
    if args.model_status {
        println!("OCR engine: {:?}", config.ocr.engine);
        println!("Tesseract languages: {}", config.ocr.languages.join("+"));
        println!("ocrs models in {}:", models.models_dir().display());
        for (model_type, available, size) in models.get_model_status() {
            println!(
                "  {:<18} {:<24} {}",
                model_type.display_name(),
                model_type.filename(),
                match (available, size) {
                    (true, Some(size)) => format!("ready ({} bytes)", size),
                    _ => "missing".to_string(),
                }
            );
        }
        return Ok(());
    }

    let recognizer = build_recognizer(&config, &models)?;
    let detector: Arc<dyn LanguageDetector> =
        Arc::new(WhatlangDetector::new(config.language.require_reliable));

    let session = Session::new(SessionOptions::from(&config));

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut shell = Shell::new(session, recognizer, detector, stdin.lock(), stdout.lock());

    if let Some(path) = args.image {
        shell.execute(Command::Open { path })?;
    }

    shell.run()?;

    info!(
        "textlens shutdown complete (last rotation {}°)",
        shell.session().rotation_angle()
    );
    Ok(())
}

/// Load configuration from the given file, the default location, or defaults.
///
/// A broken file at the default location is not fatal; the error is handed
/// back so it can be logged once logging is up.
fn load_or_create_config(
    explicit: Option<&PathBuf>,
) -> Result<(AppConfig, String, Option<anyhow::Error>)> {
    if let Some(path) = explicit {
        let config = config::load_config(path)?;
        return Ok((config, format!("{:?}", path), None));
    }

    match storage::get_config_dir() {
        Ok(config_dir) => Ok(load_optional_config(&config_dir.join("config.toml"))),
        Err(e) => Ok((AppConfig::default(), "defaults".to_string(), Some(e))),
    }
}

/// Load a config file that may be missing or broken, falling back to defaults
fn load_optional_config(path: &Path) -> (AppConfig, String, Option<anyhow::Error>) {
    if !path.exists() {
        return (AppConfig::default(), "defaults".to_string(), None);
    }

    match config::load_config(path) {
        Ok(config) => (config, format!("{:?}", path), None),
        Err(e) => (AppConfig::default(), "defaults".to_string(), Some(e)),
    }
}

/// Build the configured OCR engine
fn build_recognizer(config: &AppConfig, models: &ModelManager) -> Result<Arc<dyn TextRecognizer>> {
    match config.ocr.engine {
        OcrBackend::Tesseract => {
            let engine = TesseractEngine::new(TesseractOptions::from(&config.ocr))
                .context("Failed to start Tesseract")?;
            Ok(Arc::new(engine))
        }
        OcrBackend::Ocrs => {
            if !models.are_models_ready() {
                info!("ocrs models missing in {}", models.models_dir().display());
            }
            let (detection, recognition) = models.ensure_all_models()?;
            warn!("ocrs models read Latin script only; Russian text will not be recognized");
            Ok(Arc::new(OcrEngine::new(&detection, &recognition)?))
        }
    }
}

/// Build the model manager from CLI flags and configuration
fn model_manager(args: &Args, config: &AppConfig) -> Result<ModelManager> {
    let dir = args
        .models_dir
        .clone()
        .or_else(|| config.ocr.models_dir.clone());

    let manager = match dir {
        Some(dir) => ModelManager::with_dir(dir),
        None => ModelManager::new(),
    }
    .context("Failed to prepare models directory")?;

    Ok(manager
        .with_auto_download(config.ocr.auto_download && !args.offline)
        .with_timeout(Duration::from_secs(config.ocr.download_timeout_secs)))
}
