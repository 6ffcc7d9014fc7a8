//! Tesseract text recognition
//!
//! Reads any script Tesseract has a language pack for; the default
//! configuration asks for `rus+eng`. Built with the `tesseract` feature the
//! library is linked in through `leptess`. Otherwise the `tesseract`
//! executable is run with the image on stdin. Both paths produce TSV output,
//! which is grouped into one [`TextRegion`] per text line.

use anyhow::{bail, Context, Result};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::PathBuf;
use tracing::{debug, info};

use super::{TextRecognizer, TextRegion};
use crate::config::OcrSettings;

/// TSV level of a single word
const WORD_LEVEL: &str = "5";

/// Tesseract invocation settings
#[derive(Debug, Clone)]
pub struct TesseractOptions {
    /// Language packs, e.g. `["rus", "eng"]`
    pub languages: Vec<String>,
    /// `tessdata` directory; the installation default when unset
    pub tessdata_dir: Option<PathBuf>,
    /// Executable used without the `tesseract` feature
    pub command: PathBuf,
    /// Page segmentation mode
    pub page_segmentation_mode: u32,
}

impl From<&OcrSettings> for TesseractOptions {
    fn from(settings: &OcrSettings) -> Self {
        Self {
            languages: settings.languages.clone(),
            tessdata_dir: settings.tessdata_dir.clone(),
            command: settings.tesseract_command.clone(),
            page_segmentation_mode: settings.page_segmentation_mode,
        }
    }
}

impl TesseractOptions {
    /// Languages in Tesseract's `rus+eng` form
    pub fn language_arg(&self) -> String {
        self.languages
            .iter()
            .map(|lang| lang.trim())
            .filter(|lang| !lang.is_empty())
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// Tesseract-backed OCR engine
pub struct TesseractEngine {
    options: TesseractOptions,
    language: String,
}

impl TesseractEngine {
    /// Create the engine, failing early when Tesseract or one of the
    /// language packs is missing
    pub fn new(options: TesseractOptions) -> Result<Self> {
        let language = options.language_arg();
        if language.is_empty() {
            bail!("No Tesseract language configured");
        }

        let engine = Self { options, language };
        engine.check_installation()?;

        info!("Tesseract ready with languages '{}'", engine.language);
        Ok(engine)
    }

    #[cfg(feature = "tesseract")]
    fn check_installation(&self) -> Result<()> {
        self.init().map(|_| ())
    }

    #[cfg(feature = "tesseract")]
    fn init(&self) -> Result<leptess::LepTess> {
        let datapath = self
            .options
            .tessdata_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned());

        let mut tess = leptess::LepTess::new(datapath.as_deref(), &self.language).map_err(|e| {
            anyhow::anyhow!(
                "Failed to initialize Tesseract with '{}': {}. Install the language packs \
                 (e.g. tesseract-ocr-rus) or set ocr.tessdata_dir",
                self.language,
                e
            )
        })?;
        tess.set_variable(
            leptess::Variable::TesseditPagesegMode,
            &self.options.page_segmentation_mode.to_string(),
        )
        .map_err(|_| anyhow::anyhow!("Failed to set page segmentation mode"))?;

        Ok(tess)
    }

    #[cfg(feature = "tesseract")]
    fn run_tsv(&self, png: &[u8]) -> Result<String> {
        let mut tess = self.init()?;
        tess.set_image_from_mem(png)
            .map_err(|e| anyhow::anyhow!("Failed to load image into Tesseract: {}", e))?;
        tess.get_tsv_text(0)
            .context("Tesseract returned invalid UTF-8")
    }

    #[cfg(not(feature = "tesseract"))]
    fn check_installation(&self) -> Result<()> {
        let output = std::process::Command::new(&self.options.command)
            .args(self.tessdata_args())
            .arg("--list-langs")
            .output()
            .with_context(|| {
                format!(
                    "Failed to run {:?}. Is Tesseract installed?",
                    self.options.command
                )
            })?;

        // Older releases print the listing to stderr
        let listing = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let missing = missing_languages(&listing, &self.options.languages);
        if !missing.is_empty() {
            bail!(
                "Tesseract language packs not installed: {} (e.g. tesseract-ocr-{})",
                missing.join(", "),
                missing[0]
            );
        }
        Ok(())
    }

    #[cfg(not(feature = "tesseract"))]
    fn tessdata_args(&self) -> Vec<String> {
        match &self.options.tessdata_dir {
            Some(dir) => vec![
                "--tessdata-dir".to_string(),
                dir.to_string_lossy().into_owned(),
            ],
            None => Vec::new(),
        }
    }

    /// Arguments reading a PNG from stdin and writing TSV to stdout
    #[cfg(not(feature = "tesseract"))]
    fn cli_args(&self) -> Vec<String> {
        let mut args = vec!["stdin".to_string(), "stdout".to_string()];
        args.extend(self.tessdata_args());
        args.extend([
            "-l".to_string(),
            self.language.clone(),
            "--psm".to_string(),
            self.options.page_segmentation_mode.to_string(),
            "tsv".to_string(),
        ]);
        args
    }

    #[cfg(not(feature = "tesseract"))]
    fn run_tsv(&self, png: &[u8]) -> Result<String> {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut child = Command::new(&self.options.command)
            .args(self.cli_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {:?}", self.options.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(png)
                .context("Failed to send image to Tesseract")?;
        }

        let output = child
            .wait_with_output()
            .context("Failed to read Tesseract output")?;
        if !output.status.success() {
            bail!(
                "Tesseract failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        String::from_utf8(output.stdout).context("Tesseract returned invalid UTF-8")
    }
}

impl TextRecognizer for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextRegion>> {
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .context("Failed to encode image for Tesseract")?;

        let tsv = self.run_tsv(png.get_ref())?;
        let regions = parse_tsv(&tsv);
        debug!(
            "Tesseract ({}) found {} lines",
            self.language,
            regions.len()
        );
        Ok(regions)
    }
}

/// Text line being assembled from word rows
struct LineBuilder {
    key: [u32; 4],
    words: Vec<String>,
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
    confidence_sum: f32,
    confidence_count: u32,
}

impl LineBuilder {
    fn finish(self) -> TextRegion {
        TextRegion {
            text: self.words.join(" "),
            bounds: (
                self.left,
                self.top,
                self.right - self.left,
                self.bottom - self.top,
            ),
            confidence: (self.confidence_count > 0)
                .then(|| self.confidence_sum / self.confidence_count as f32 / 100.0),
        }
    }
}

/// Group Tesseract TSV word rows into text lines, in output order
pub fn parse_tsv(tsv: &str) -> Vec<TextRegion> {
    let mut regions = Vec::new();
    let mut current: Option<LineBuilder> = None;

    for row in tsv.lines() {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 || fields[0] != WORD_LEVEL {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let numbers: Option<Vec<u32>> = fields[1..10].iter().map(|f| f.parse().ok()).collect();
        let Some(numbers) = numbers else {
            continue;
        };
        let key = [numbers[0], numbers[1], numbers[2], numbers[3]];
        let (left, top, width, height) = (numbers[5], numbers[6], numbers[7], numbers[8]);
        let confidence = fields[10].parse::<f32>().ok().filter(|c| *c >= 0.0);

        let line = match current.take() {
            Some(line) if line.key == key => current.insert(line),
            other => {
                regions.extend(other.map(LineBuilder::finish));
                current.insert(LineBuilder {
                    key,
                    words: Vec::new(),
                    left,
                    top,
                    right: left,
                    bottom: top,
                    confidence_sum: 0.0,
                    confidence_count: 0,
                })
            }
        };

        line.words.push(text.to_string());
        line.left = line.left.min(left);
        line.top = line.top.min(top);
        line.right = line.right.max(left.saturating_add(width));
        line.bottom = line.bottom.max(top.saturating_add(height));
        if let Some(confidence) = confidence {
            line.confidence_sum += confidence;
            line.confidence_count += 1;
        }
    }

    regions.extend(current.map(LineBuilder::finish));
    regions
}

/// Requested languages absent from a `--list-langs` listing
#[cfg(not(feature = "tesseract"))]
fn missing_languages(listing: &str, wanted: &[String]) -> Vec<String> {
    let installed: Vec<&str> = listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of"))
        .collect();

    wanted
        .iter()
        .map(|lang| lang.trim())
        .filter(|lang| !lang.is_empty() && !installed.contains(lang))
        .map(str::to_string)
        .collect()
}
