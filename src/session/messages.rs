//! User-facing notices emitted by session operations

use std::fmt;

use crate::analysis::DetectedLanguage;

/// Message shown to the user after an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The image was cleared
    ImageCleared,
    /// An action needs an image first
    UploadPrompt,
    /// Recognition produced no text
    NoTextFound,
    /// A supported language was detected
    LanguageDetected(DetectedLanguage),
    /// Text is in a language other than Russian or English
    UnsupportedLanguage,
    /// The detector could not classify the text
    UndeterminedLanguage,
}

impl Notice {
    /// Notice describing a classification result
    pub fn for_language(language: DetectedLanguage) -> Self {
        match language {
            DetectedLanguage::Russian | DetectedLanguage::English => {
                Notice::LanguageDetected(language)
            }
            DetectedLanguage::Unsupported => Notice::UnsupportedLanguage,
            DetectedLanguage::Undetermined => Notice::UndeterminedLanguage,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ImageCleared => write!(f, "Image cleared. Please upload a new image."),
            Notice::UploadPrompt => write!(f, "Please upload an image to get started."),
            Notice::NoTextFound => write!(f, "No text was recognized."),
            Notice::LanguageDetected(language) => write!(
                f,
                "Detected language: {}",
                language.label().unwrap_or(language.code())
            ),
            Notice::UnsupportedLanguage => {
                write!(f, "Only Russian and English are supported.")
            }
            Notice::UndeterminedLanguage => {
                write!(f, "Could not determine the language. Please try again.")
            }
        }
    }
}
