//! Session state controller
//!
//! Owns the uploaded image, its rotation, the rotated display image and the
//! results of the last recognition. All mutation goes through the methods
//! below; each runs to completion before the next event is handled.

use image::{DynamicImage, ImageFormat};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::analysis::{classify, DetectedLanguage, LanguageDetector};
use crate::config::AppConfig;
use crate::vision::{normalize_degrees, rotate_expand, RotationOptions, TextRecognizer};

use super::{Notice, SessionError};

/// Behaviour knobs for a [`Session`]
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Degrees applied by rotate left/right
    pub rotation_step: i64,
    /// Values the rotation slider can take
    pub slider_range: RangeInclusive<i64>,
    /// Rendering of rotated images
    pub rotation: RotationOptions,
    /// Drop extracted text and language when the image is replaced or cleared
    pub reset_results_on_new_image: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            rotation_step: config.rotation.step_degrees,
            slider_range: config.rotation.slider_min..=config.rotation.slider_max,
            rotation: RotationOptions::from(&config.rotation),
            reset_results_on_new_image: config.session.reset_results_on_new_image,
        }
    }
}

/// One user's isolated interaction state
#[derive(Debug, Clone)]
pub struct Session {
    options: SessionOptions,
    source: Option<DynamicImage>,
    angle: i64,
    display: Option<DynamicImage>,
    extracted_text: Option<String>,
    language: Option<DetectedLanguage>,
    last_elapsed: Option<Duration>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl Session {
    /// Create an empty session
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            source: None,
            angle: 0,
            display: None,
            extracted_text: None,
            language: None,
            last_elapsed: None,
        }
    }

    /// The uploaded image, unrotated
    pub fn source_image(&self) -> Option<&DynamicImage> {
        self.source.as_ref()
    }

    /// Current rotation in degrees, counter-clockwise, unbounded
    pub fn rotation_angle(&self) -> i64 {
        self.angle
    }

    /// The source image rotated by the current angle
    pub fn display_image(&self) -> Option<&DynamicImage> {
        self.display.as_ref()
    }

    /// Text of the last successful recognition
    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    /// Language of the last classified text
    pub fn detected_language(&self) -> Option<DetectedLanguage> {
        self.language
    }

    /// Duration of the last successful recognition
    pub fn last_elapsed(&self) -> Option<Duration> {
        self.last_elapsed
    }

    /// Whether an image is loaded
    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    /// Position the rotation slider shows for the current angle
    pub fn slider_position(&self) -> i64 {
        self.clamp_to_slider(normalize_degrees(self.angle))
    }

    /// Decode a PNG or JPEG payload and make it the current image.
    /// Nothing changes if decoding fails.
    pub fn upload_image(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let format = image::guess_format(bytes)?;
        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
            return Err(SessionError::UnsupportedFormat(format!("{:?}", format)));
        }

        let decoded = image::load_from_memory_with_format(bytes, format)?;
        self.set_image(decoded);
        Ok(())
    }

    /// Make an already decoded image the current image
    pub fn set_image(&mut self, image: DynamicImage) {
        info!(
            "Loaded {}x{} image ({:?})",
            image.width(),
            image.height(),
            image.color()
        );

        self.display = Some(image.clone());
        self.source = Some(image);
        self.angle = 0;

        if self.options.reset_results_on_new_image {
            self.reset_results();
        }
    }

    /// Turn the image counter-clockwise by one step
    pub fn rotate_left(&mut self) {
        if self.adjust_angle(self.options.rotation_step) {
            self.refresh_display();
        }
    }

    /// Turn the image clockwise by one step
    pub fn rotate_right(&mut self) {
        if self.adjust_angle(self.options.rotation_step.saturating_neg()) {
            self.refresh_display();
        }
    }

    /// Set the angle from the slider, clamped to the slider range
    pub fn set_rotation(&mut self, degrees: i64) {
        if self.apply_slider(degrees) {
            self.refresh_display();
        }
    }

    /// Drop the image and reset the rotation
    pub fn clear_image(&mut self) -> Notice {
        self.source = None;
        self.display = None;
        self.angle = 0;

        if self.options.reset_results_on_new_image {
            self.reset_results();
        }

        info!("Image cleared");
        Notice::ImageCleared
    }

    /// Access to recognition, offered only while a display image exists
    pub fn recognition(&mut self) -> Option<Recognition<'_>> {
        let image = self.display.as_ref()?;
        Some(Recognition {
            image,
            text: &mut self.extracted_text,
            language: &mut self.language,
            elapsed: &mut self.last_elapsed,
        })
    }

    /// Add `delta` to the angle; false when there is no image
    fn adjust_angle(&mut self, delta: i64) -> bool {
        if self.source.is_none() {
            return false;
        }
        self.angle = self.angle.saturating_add(delta);
        true
    }

    /// Apply a slider value; true when the angle changed
    fn apply_slider(&mut self, degrees: i64) -> bool {
        if self.source.is_none() {
            return false;
        }
        let degrees = self.clamp_to_slider(degrees);
        if degrees == self.angle {
            return false;
        }
        self.angle = degrees;
        true
    }

    /// Clamp into the slider range. An inverted range collapses onto its start.
    fn clamp_to_slider(&self, degrees: i64) -> i64 {
        let (min, max) = (
            *self.options.slider_range.start(),
            *self.options.slider_range.end(),
        );
        degrees.min(max).max(min)
    }

    /// Recompute the display image from the source and the angle
    fn refresh_display(&mut self) {
        self.display = self
            .source
            .as_ref()
            .map(|source| rotate_expand(source, self.angle, &self.options.rotation));

        if let Some(rotated) = &self.display {
            debug!(
                "Display image at {} degrees is {}x{}",
                self.angle,
                rotated.width(),
                rotated.height()
            );
        }
    }

    fn reset_results(&mut self) {
        self.extracted_text = None;
        self.language = None;
        self.last_elapsed = None;
    }
}

/// Result of one recognition run
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionReport {
    /// Recognized fragments joined by single spaces
    pub text: String,
    /// Classification of this run's text; `None` when the text was empty
    pub language: Option<DetectedLanguage>,
    /// Time spent in the OCR engine and joining its output
    pub elapsed: Duration,
    /// Number of regions returned by the engine
    pub regions: usize,
}

impl RecognitionReport {
    /// Notices to show for this run
    pub fn notices(&self) -> Vec<Notice> {
        match self.language {
            Some(language) => vec![Notice::for_language(language)],
            None if self.text.is_empty() => vec![Notice::NoTextFound],
            None => Vec::new(),
        }
    }
}

/// Recognition handle; only exists while the session has a display image
pub struct Recognition<'a> {
    image: &'a DynamicImage,
    text: &'a mut Option<String>,
    language: &'a mut Option<DetectedLanguage>,
    elapsed: &'a mut Option<Duration>,
}

impl Recognition<'_> {
    /// Run OCR on the display image, then classify the text.
    ///
    /// On OCR failure nothing is committed. Empty text leaves the stored
    /// language untouched and skips detection.
    pub fn run(
        self,
        recognizer: &dyn TextRecognizer,
        detector: &dyn LanguageDetector,
    ) -> Result<RecognitionReport, SessionError> {
        let start = Instant::now();

        let regions = recognizer
            .recognize(self.image)
            .map_err(|e| SessionError::Recognition(e.into()))?;
        let text = regions
            .iter()
            .map(|region| region.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let elapsed = start.elapsed();
        info!(
            "{} recognized {} regions ({} chars) in {:?}",
            recognizer.name(),
            regions.len(),
            text.chars().count(),
            elapsed
        );

        *self.text = Some(text.clone());
        *self.elapsed = Some(elapsed);

        let language = if text.is_empty() {
            None
        } else {
            let language = classify(detector, &text);
            *self.language = Some(language);
            Some(language)
        };

        Ok(RecognitionReport {
            text,
            language,
            elapsed,
            regions: regions.len(),
        })
    }
}
