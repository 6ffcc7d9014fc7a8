//! Language identification of recognized text
//!
//! Only Russian and English are supported; every other classification is
//! reported as unsupported without keeping the detected code.

use thiserror::Error;
use tracing::{debug, info};
use whatlang::Lang;

/// Failure of a language detector
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    /// No confident classification was possible (text too short, digits only, ...)
    #[error("language could not be determined")]
    Undetermined,
}

/// A language identification engine
pub trait LanguageDetector: Send + Sync {
    /// Classify `text`, returning an ISO 639-1 code where one exists
    /// (ISO 639-3 otherwise)
    fn detect(&self, text: &str) -> Result<String, DetectionError>;
}

/// Outcome of classifying extracted text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedLanguage {
    Russian,
    English,
    /// Detected, but neither Russian nor English
    Unsupported,
    /// The detector could not decide
    Undetermined,
}

impl DetectedLanguage {
    /// Stable code for this state
    pub fn code(&self) -> &'static str {
        match self {
            DetectedLanguage::Russian => "ru",
            DetectedLanguage::English => "en",
            DetectedLanguage::Unsupported => "unsupported",
            DetectedLanguage::Undetermined => "undetermined",
        }
    }

    /// Human-readable name, only for the supported languages
    pub fn label(&self) -> Option<&'static str> {
        match self {
            DetectedLanguage::Russian => Some("Russian"),
            DetectedLanguage::English => Some("English"),
            DetectedLanguage::Unsupported | DetectedLanguage::Undetermined => None,
        }
    }

    /// Map a detector code onto the supported set
    pub fn from_code(code: &str) -> Self {
        match code {
            "ru" => DetectedLanguage::Russian,
            "en" => DetectedLanguage::English,
            _ => DetectedLanguage::Unsupported,
        }
    }
}

/// Run `detector` on `text` and fold the result into a [`DetectedLanguage`].
/// Detector failures degrade to `Undetermined` and never propagate.
pub fn classify(detector: &dyn LanguageDetector, text: &str) -> DetectedLanguage {
    match detector.detect(text) {
        Ok(code) => {
            let language = DetectedLanguage::from_code(&code);
            if language == DetectedLanguage::Unsupported {
                info!("Detected unsupported language '{}'", code);
            } else {
                debug!("Detected language '{}'", code);
            }
            language
        }
        Err(e) => {
            info!("Language detection failed: {}", e);
            DetectedLanguage::Undetermined
        }
    }
}

/// Texts with fewer letters than this are too short for trigram statistics
/// to tell close relatives apart (Russian from Ukrainian, English from Dutch)
const SHORT_TEXT_LETTERS: usize = 40;

/// Statistical detector backed by `whatlang` trigram profiles.
///
/// Short texts are only classified within their script: Cyrillic reads as
/// Russian and Latin as English. Other scripts are reported as detected.
#[derive(Debug, Clone)]
pub struct WhatlangDetector {
    require_reliable: bool,
    in_scope: whatlang::Detector,
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new(false)
    }
}

impl WhatlangDetector {
    /// Create a detector. With `require_reliable` set, low-confidence guesses
    /// on longer texts count as undetermined.
    pub fn new(require_reliable: bool) -> Self {
        Self {
            require_reliable,
            in_scope: whatlang::Detector::with_allowlist(vec![Lang::Rus, Lang::Eng]),
        }
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String, DetectionError> {
        let info = whatlang::detect(text).ok_or(DetectionError::Undetermined)?;

        debug!(
            "whatlang: {:?} (confidence {:.2}, reliable {})",
            info.lang(),
            info.confidence(),
            info.is_reliable()
        );

        if matches!(info.lang(), Lang::Rus | Lang::Eng) {
            return Ok(two_letter_code(info.lang()).to_string());
        }

        let letters = text.chars().filter(|c| c.is_alphabetic()).count();
        if letters < SHORT_TEXT_LETTERS {
            let lang = self
                .in_scope
                .detect_lang(text)
                .ok_or(DetectionError::Undetermined)?;
            debug!("Short text ({} letters) read as {:?}", letters, lang);
            return Ok(two_letter_code(lang).to_string());
        }

        if self.require_reliable && !info.is_reliable() {
            return Err(DetectionError::Undetermined);
        }

        Ok(two_letter_code(info.lang()).to_string())
    }
}

fn two_letter_code(lang: Lang) -> &'static str {
    match lang {
        Lang::Rus => "ru",
        Lang::Eng => "en",
        Lang::Ukr => "uk",
        Lang::Bel => "be",
        Lang::Bul => "bg",
        Lang::Srp => "sr",
        Lang::Mkd => "mk",
        Lang::Deu => "de",
        Lang::Fra => "fr",
        Lang::Spa => "es",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        other => other.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector(Result<String, DetectionError>);

    impl LanguageDetector for FixedDetector {
        fn detect(&self, _text: &str) -> Result<String, DetectionError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_codes_and_labels() {
        assert_eq!(DetectedLanguage::Russian.code(), "ru");
        assert_eq!(DetectedLanguage::English.code(), "en");
        assert_eq!(DetectedLanguage::Unsupported.code(), "unsupported");
        assert_eq!(DetectedLanguage::Undetermined.code(), "undetermined");

        assert_eq!(DetectedLanguage::Russian.label(), Some("Russian"));
        assert_eq!(DetectedLanguage::English.label(), Some("English"));
        assert_eq!(DetectedLanguage::Unsupported.label(), None);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(DetectedLanguage::from_code("ru"), DetectedLanguage::Russian);
        assert_eq!(DetectedLanguage::from_code("en"), DetectedLanguage::English);
        assert_eq!(DetectedLanguage::from_code("de"), DetectedLanguage::Unsupported);
        assert_eq!(DetectedLanguage::from_code("EN"), DetectedLanguage::Unsupported);
    }

    #[test]
    fn test_classify_with_fixed_detector() {
        let fr = FixedDetector(Ok("fr".to_string()));
        assert_eq!(classify(&fr, "bonjour"), DetectedLanguage::Unsupported);

        let ru = FixedDetector(Ok("ru".to_string()));
        assert_eq!(classify(&ru, "привет"), DetectedLanguage::Russian);

        let failing = FixedDetector(Err(DetectionError::Undetermined));
        assert_eq!(classify(&failing, "???"), DetectedLanguage::Undetermined);
    }

    #[test]
    fn test_whatlang_russian() {
        let detector = WhatlangDetector::default();
        let text = "Съешь же ещё этих мягких французских булок, да выпей чаю. \
                    Это предложение написано на русском языке.";
        assert_eq!(detector.detect(text), Ok("ru".to_string()));
        assert_eq!(classify(&detector, text), DetectedLanguage::Russian);
    }

    #[test]
    fn test_whatlang_english() {
        let detector = WhatlangDetector::default();
        let text = "The quick brown fox jumps over the lazy dog. \
                    This sentence is written in plain English for testing.";
        assert_eq!(classify(&detector, text), DetectedLanguage::English);
    }

    #[test]
    fn test_whatlang_other_language_is_unsupported() {
        let detector = WhatlangDetector::default();
        let text = "Der schnelle braune Fuchs springt über den faulen Hund. \
                    Dieser Satz ist auf Deutsch geschrieben und ziemlich lang.";
        assert_eq!(detector.detect(text), Ok("de".to_string()));
        assert_eq!(classify(&detector, text), DetectedLanguage::Unsupported);
    }

    #[test]
    fn test_whatlang_short_russian() {
        let detector = WhatlangDetector::default();
        for text in ["Москва", "Распознанный текст", "Меню дня суп борщ"] {
            assert_eq!(detector.detect(text), Ok("ru".to_string()), "{}", text);
        }
    }

    #[test]
    fn test_whatlang_short_english() {
        let detector = WhatlangDetector::default();
        for text in ["Hello world", "Open now", "EXIT"] {
            assert_eq!(classify(&detector, text), DetectedLanguage::English, "{}", text);
        }
    }

    #[test]
    fn test_whatlang_short_other_script_is_unsupported() {
        let detector = WhatlangDetector::default();
        assert_eq!(classify(&detector, "Καλημέρα"), DetectedLanguage::Unsupported);
    }

    #[test]
    fn test_whatlang_digits_are_undetermined() {
        let detector = WhatlangDetector::default();
        assert_eq!(detector.detect("12345 678"), Err(DetectionError::Undetermined));
        assert_eq!(classify(&detector, "12345 678"), DetectedLanguage::Undetermined);
    }
}
