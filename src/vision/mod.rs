//! Vision/OCR Layer
//!
//! Turns the displayed image into text regions. The recognition engine sits
//! behind [`TextRecognizer`] so the session does not depend on a backend:
//! - Tesseract with Russian and English language packs (default)
//! - `ocrs` models run through `rten` (Latin script)
//! - anything else implementing the trait (tests use scripted engines)

pub mod models;
pub mod ocr;
pub mod tesseract;
pub mod transform;

use anyhow::Result;
use image::DynamicImage;

pub use models::ModelManager;
pub use ocr::OcrEngine;
pub use tesseract::{TesseractEngine, TesseractOptions};
pub use transform::{normalize_degrees, rotate_expand, RotationOptions};

/// Detected text region from OCR
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    /// Detected text content
    pub text: String,
    /// Bounding box (x, y, width, height)
    pub bounds: (u32, u32, u32, u32),
    /// Confidence score (0.0 - 1.0), when the engine reports one
    pub confidence: Option<f32>,
}

/// A text recognition engine.
///
/// Implementations are built once and shared between sessions, so
/// `recognize` takes `&self`. Regions must be returned in reading order.
pub trait TextRecognizer: Send + Sync {
    /// Short engine identifier used in logs
    fn name(&self) -> &str;

    /// Recognize all text regions in `image`
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextRegion>>;
}
