//! OCR (Optical Character Recognition) module
//!
//! Runs the `ocrs` detection and recognition models on a decoded image.

use anyhow::{Context, Result};
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngineParams, TextItem};
use rten::Model;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::{TextRecognizer, TextRegion};

/// OCR engine backed by `ocrs` text detection and recognition models
pub struct OcrEngine {
    inner: ocrs::OcrEngine,
}

impl OcrEngine {
    /// Load both models and build the engine. This is expensive; build once and share.
    pub fn new(detection_model: &Path, recognition_model: &Path) -> Result<Self> {
        let start = Instant::now();

        let detection = Model::load_file(detection_model)
            .with_context(|| format!("Failed to load text detection model {:?}", detection_model))?;
        let recognition = Model::load_file(recognition_model).with_context(|| {
            format!("Failed to load text recognition model {:?}", recognition_model)
        })?;

        let inner = ocrs::OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection),
            recognition_model: Some(recognition),
            ..Default::default()
        })
        .context("Failed to initialize OCR engine")?;

        info!("OCR engine ready in {:?}", start.elapsed());
        Ok(Self { inner })
    }
}

impl TextRecognizer for OcrEngine {
    fn name(&self) -> &str {
        "ocrs"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextRegion>> {
        let rgb = image.to_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .context("Failed to create image source")?;

        let input = self
            .inner
            .prepare_input(source)
            .context("Failed to prepare OCR input")?;
        let word_rects = self
            .inner
            .detect_words(&input)
            .context("Failed to detect words")?;
        let line_rects = self.inner.find_text_lines(&input, &word_rects);
        let lines = self
            .inner
            .recognize_text(&input, &line_rects)
            .context("Failed to recognize text")?;

        let regions: Vec<TextRegion> = lines
            .iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string();
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                let rect = line.bounding_rect();
                Some(TextRegion {
                    text: text.to_string(),
                    bounds: (
                        rect.left().max(0) as u32,
                        rect.top().max(0) as u32,
                        rect.width().max(0) as u32,
                        rect.height().max(0) as u32,
                    ),
                    confidence: None,
                })
            })
            .collect();

        debug!(
            "ocrs found {} word boxes, {} lines, {} non-empty",
            word_rects.len(),
            line_rects.len(),
            regions.len()
        );

        Ok(regions)
    }
}
