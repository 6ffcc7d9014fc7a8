//! Event cycles
//!
//! A UI may present several inputs at once (a button press and a slider
//! move in the same frame). [`Session::process_cycle`] applies them in a
//! fixed order: upload, rotate left, rotate right, slider, clear, recognize.
//! The slider is the last writer to the angle, so it wins over the buttons.

use tracing::{debug, warn};

use crate::analysis::LanguageDetector;
use crate::vision::TextRecognizer;

use super::{Notice, RecognitionReport, Session, SessionError};

/// Inputs presented during one UI event cycle
#[derive(Debug, Clone, Default)]
pub struct UiCycle {
    /// Raw bytes of a newly uploaded file
    pub upload: Option<Vec<u8>>,
    /// Rotate left button pressed
    pub rotate_left: bool,
    /// Rotate right button pressed
    pub rotate_right: bool,
    /// Slider value, only when the user moved the slider
    pub slider: Option<i64>,
    /// Clear button pressed
    pub clear: bool,
    /// Recognize button pressed
    pub recognize: bool,
}

impl UiCycle {
    pub fn upload(bytes: Vec<u8>) -> Self {
        Self {
            upload: Some(bytes),
            ..Self::default()
        }
    }

    pub fn rotate_left() -> Self {
        Self {
            rotate_left: true,
            ..Self::default()
        }
    }

    pub fn rotate_right() -> Self {
        Self {
            rotate_right: true,
            ..Self::default()
        }
    }

    pub fn slider(degrees: i64) -> Self {
        Self {
            slider: Some(degrees),
            ..Self::default()
        }
    }

    pub fn clear() -> Self {
        Self {
            clear: true,
            ..Self::default()
        }
    }

    pub fn recognize() -> Self {
        Self {
            recognize: true,
            ..Self::default()
        }
    }
}

/// Everything a cycle produced for display
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// Messages for the user, in emission order
    pub notices: Vec<Notice>,
    /// Report of the recognition run, if one succeeded
    pub report: Option<RecognitionReport>,
    /// Failed operations; each one left the session untouched
    pub errors: Vec<SessionError>,
}

impl Session {
    /// Apply one event cycle
    pub fn process_cycle(
        &mut self,
        cycle: UiCycle,
        recognizer: &dyn TextRecognizer,
        detector: &dyn LanguageDetector,
    ) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();
        debug!("Processing {:?}", CycleSummary(&cycle));

        if let Some(bytes) = &cycle.upload {
            if let Err(e) = self.upload_image(bytes) {
                warn!("Upload rejected: {}", e);
                outcome.errors.push(e);
            }
        }

        if cycle.rotate_left {
            self.rotate_left();
        }
        if cycle.rotate_right {
            self.rotate_right();
        }
        if let Some(degrees) = cycle.slider {
            self.set_rotation(degrees);
        }

        if cycle.clear {
            outcome.notices.push(self.clear_image());
        }

        if cycle.recognize {
            match self.recognition() {
                Some(recognition) => match recognition.run(recognizer, detector) {
                    Ok(report) => {
                        outcome.notices.extend(report.notices());
                        outcome.report = Some(report);
                    }
                    Err(e) => {
                        warn!("Recognition failed: {}", e);
                        outcome.errors.push(e);
                    }
                },
                None => outcome.notices.push(Notice::UploadPrompt),
            }
        }

        outcome
    }
}

/// Debug view of a cycle without the upload payload
struct CycleSummary<'a>(&'a UiCycle);

impl std::fmt::Debug for CycleSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.0;
        f.debug_struct("UiCycle")
            .field("upload_bytes", &c.upload.as_ref().map(Vec::len))
            .field("rotate_left", &c.rotate_left)
            .field("rotate_right", &c.rotate_right)
            .field("slider", &c.slider)
            .field("clear", &c.clear)
            .field("recognize", &c.recognize)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DetectedLanguage;
    use crate::session::state::tests::{encode, sample_image, FixedDetector, ScriptedRecognizer};
    use image::{GenericImageView, ImageFormat};

    fn engines() -> (ScriptedRecognizer, FixedDetector) {
        (
            ScriptedRecognizer::new(&["quick", "fox"]),
            FixedDetector(Ok("en".to_string())),
        )
    }

    fn png() -> Vec<u8> {
        encode(&sample_image(4, 2), ImageFormat::Png)
    }

    #[test]
    fn test_upload_and_rotate_in_one_cycle() {
        let (ocr, lang) = engines();
        let mut session = Session::default();

        let cycle = UiCycle {
            upload: Some(png()),
            rotate_left: true,
            ..UiCycle::default()
        };
        let outcome = session.process_cycle(cycle, &ocr, &lang);

        assert!(outcome.errors.is_empty());
        assert_eq!(session.rotation_angle(), 90);
        assert_eq!(session.display_image().unwrap().dimensions(), (2, 4));
    }

    #[test]
    fn test_slider_wins_over_buttons() {
        let (ocr, lang) = engines();
        let mut session = Session::default();
        session.process_cycle(UiCycle::upload(png()), &ocr, &lang);

        let cycle = UiCycle {
            rotate_left: true,
            slider: Some(30),
            ..UiCycle::default()
        };
        session.process_cycle(cycle, &ocr, &lang);
        assert_eq!(session.rotation_angle(), 30);

        // A slider still showing the old angle undoes the button press
        let cycle = UiCycle {
            rotate_right: true,
            slider: Some(30),
            ..UiCycle::default()
        };
        session.process_cycle(cycle, &ocr, &lang);
        assert_eq!(session.rotation_angle(), 30);
    }

    #[test]
    fn test_untouched_slider_keeps_button_rotation() {
        let (ocr, lang) = engines();
        let mut session = Session::default();
        session.process_cycle(UiCycle::upload(png()), &ocr, &lang);

        for _ in 0..3 {
            session.process_cycle(UiCycle::rotate_left(), &ocr, &lang);
        }
        assert_eq!(session.rotation_angle(), 270);
        assert_eq!(session.slider_position(), -90);
    }

    #[test]
    fn test_rotate_both_ways_cancels() {
        let (ocr, lang) = engines();
        let mut session = Session::default();
        session.process_cycle(UiCycle::upload(png()), &ocr, &lang);

        let cycle = UiCycle {
            rotate_left: true,
            rotate_right: true,
            ..UiCycle::default()
        };
        session.process_cycle(cycle, &ocr, &lang);
        assert_eq!(session.rotation_angle(), 0);
    }

    #[test]
    fn test_recognize_without_image_prompts() {
        let (ocr, lang) = engines();
        let mut session = Session::default();

        let outcome = session.process_cycle(UiCycle::recognize(), &ocr, &lang);
        assert_eq!(outcome.notices, vec![Notice::UploadPrompt]);
        assert!(outcome.report.is_none());
        assert!(ocr.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_before_recognize_in_same_cycle() {
        let (ocr, lang) = engines();
        let mut session = Session::default();
        session.process_cycle(UiCycle::upload(png()), &ocr, &lang);

        let cycle = UiCycle {
            clear: true,
            recognize: true,
            ..UiCycle::default()
        };
        let outcome = session.process_cycle(cycle, &ocr, &lang);
        assert_eq!(outcome.notices, vec![Notice::ImageCleared, Notice::UploadPrompt]);
        assert!(ocr.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_recognize_cycle_reports() {
        let (ocr, lang) = engines();
        let mut session = Session::default();
        session.process_cycle(UiCycle::upload(png()), &ocr, &lang);

        let outcome = session.process_cycle(UiCycle::recognize(), &ocr, &lang);
        let report = outcome.report.unwrap();
        assert_eq!(report.text, "quick fox");
        assert_eq!(
            outcome.notices,
            vec![Notice::LanguageDetected(DetectedLanguage::English)]
        );
    }

    #[test]
    fn test_bad_upload_is_reported() {
        let (ocr, lang) = engines();
        let mut session = Session::default();

        let outcome = session.process_cycle(UiCycle::upload(vec![0, 1, 2, 3]), &ocr, &lang);
        assert_eq!(outcome.errors.len(), 1);
        assert!(!session.has_image());
    }

    #[test]
    fn test_failed_recognition_is_reported() {
        let mut session = Session::default();
        let failing = ScriptedRecognizer::failing();
        let lang = FixedDetector(Ok("en".to_string()));
        session.process_cycle(UiCycle::upload(png()), &failing, &lang);

        let outcome = session.process_cycle(UiCycle::recognize(), &failing, &lang);
        assert!(outcome.report.is_none());
        assert!(matches!(outcome.errors[0], SessionError::Recognition(_)));
        assert!(session.extracted_text().is_none());
    }
}
