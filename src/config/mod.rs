//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Session behaviour
    pub session: SessionSettings,
    /// OCR engine settings
    pub ocr: OcrSettings,
    /// Language detection settings
    pub language: LanguageSettings,
    /// Image rotation settings
    pub rotation: RotationSettings,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Session-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Drop extracted text and detected language when the image is replaced or cleared
    pub reset_results_on_new_image: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reset_results_on_new_image: true,
        }
    }
}

/// Text recognition backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// Tesseract with the configured language packs
    #[default]
    Tesseract,
    /// `ocrs` neural models (Latin script only)
    Ocrs,
}

/// OCR-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Recognition backend
    pub engine: OcrBackend,
    /// Tesseract language packs, combined as `rus+eng`
    pub languages: Vec<String>,
    /// Tesseract `tessdata` directory (system default when unset)
    pub tessdata_dir: Option<PathBuf>,
    /// Tesseract executable, used when built without the `tesseract` feature
    pub tesseract_command: PathBuf,
    /// Tesseract page segmentation mode (3 = fully automatic)
    pub page_segmentation_mode: u32,
    /// Directory holding the `.rten` models (defaults to `<data dir>/models`)
    pub models_dir: Option<PathBuf>,
    /// Download missing models on startup
    pub auto_download: bool,
    /// Download timeout in seconds
    pub download_timeout_secs: u64,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            engine: OcrBackend::Tesseract,
            languages: vec!["rus".to_string(), "eng".to_string()],
            tessdata_dir: None,
            tesseract_command: PathBuf::from("tesseract"),
            page_segmentation_mode: 3,
            models_dir: None,
            auto_download: true,
            download_timeout_secs: 300,
        }
    }
}

/// Language detection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSettings {
    /// Treat low-confidence guesses as undetermined
    pub require_reliable: bool,
}

/// Resampling used for non right-angle rotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationInterpolation {
    /// Nearest neighbour (keeps hard glyph edges)
    #[default]
    Nearest,
    /// Bilinear filtering
    Bilinear,
}

/// Rotation-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// Degrees added/subtracted by the rotate left/right commands
    pub step_degrees: i64,
    /// Lower bound of the rotation slider
    pub slider_min: i64,
    /// Upper bound of the rotation slider
    pub slider_max: i64,
    /// RGBA colour for canvas area exposed by rotation
    pub fill: [u8; 4],
    /// Resampling filter
    pub interpolation: RotationInterpolation,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            step_degrees: 90,
            slider_min: -180,
            slider_max: 180,
            fill: [255, 255, 255, 255],
            interpolation: RotationInterpolation::Nearest,
        }
    }
}

impl AppConfig {
    /// Reject settings the session cannot operate with
    pub fn validate(&self) -> Result<()> {
        let rotation = &self.rotation;
        ensure!(
            rotation.slider_min <= rotation.slider_max,
            "rotation.slider_min ({}) is greater than rotation.slider_max ({})",
            rotation.slider_min,
            rotation.slider_max
        );
        ensure!(
            rotation.step_degrees != i64::MIN,
            "rotation.step_degrees is out of range"
        );

        if self.ocr.engine == OcrBackend::Tesseract {
            ensure!(
                self.ocr.languages.iter().any(|lang| !lang.trim().is_empty()),
                "ocr.languages must name at least one Tesseract language"
            );
            ensure!(
                self.ocr.page_segmentation_mode <= 13,
                "ocr.page_segmentation_mode must be between 0 and 13"
            );
        }

        Ok(())
    }
}

/// Load and validate configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.general.log_level, "info");
        assert!(config.session.reset_results_on_new_image);

        assert_eq!(config.ocr.engine, OcrBackend::Tesseract);
        assert_eq!(config.ocr.languages, vec!["rus", "eng"]);
        assert_eq!(config.ocr.page_segmentation_mode, 3);
        assert!(config.ocr.models_dir.is_none());
        assert!(config.ocr.auto_download);
        assert_eq!(config.ocr.download_timeout_secs, 300);

        assert!(!config.language.require_reliable);

        assert_eq!(config.rotation.step_degrees, 90);
        assert_eq!(config.rotation.slider_min, -180);
        assert_eq!(config.rotation.slider_max, 180);
        assert_eq!(config.rotation.fill, [255, 255, 255, 255]);
        assert_eq!(config.rotation.interpolation, RotationInterpolation::Nearest);
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.ocr.models_dir = Some(PathBuf::from("/opt/models"));
        config.rotation.interpolation = RotationInterpolation::Bilinear;
        config.session.reset_results_on_new_image = false;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.ocr.models_dir, Some(PathBuf::from("/opt/models")));
        assert_eq!(parsed.rotation.interpolation, RotationInterpolation::Bilinear);
        assert!(!parsed.session.reset_results_on_new_image);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [rotation]
            step_degrees = 45
            "#,
        )
        .unwrap();

        assert_eq!(parsed.rotation.step_degrees, 45);
        assert_eq!(parsed.rotation.slider_max, 180);
        assert!(parsed.ocr.auto_download);
        assert_eq!(parsed.general.log_level, "info");
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AppConfig::default();
        config.language.require_reliable = true;

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert!(loaded.language.require_reliable);
        assert_eq!(loaded.rotation.step_degrees, config.rotation.step_degrees);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_slider_range_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[rotation]\nslider_min = 90\nslider_max = -90").unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("slider_min"));
    }

    #[test]
    fn test_extreme_rotation_step_rejected() {
        let mut config = AppConfig::default();
        config.rotation.step_degrees = i64::MIN;
        assert!(config.validate().is_err());

        config.rotation.step_degrees = -90;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tesseract_needs_a_language() {
        let mut config = AppConfig::default();
        config.ocr.languages = vec![" ".to_string()];
        assert!(config.validate().is_err());

        config.ocr.engine = OcrBackend::Ocrs;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_parsed_from_toml() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [ocr]
            engine = "ocrs"
            languages = ["eng"]
            "#,
        )
        .unwrap();

        assert_eq!(parsed.ocr.engine, OcrBackend::Ocrs);
        assert_eq!(parsed.ocr.languages, vec!["eng"]);
        assert_eq!(parsed.ocr.tesseract_command, PathBuf::from("tesseract"));
    }
}
