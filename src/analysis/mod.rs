//! Text Analysis Layer
//!
//! Classifies recognized text into one of the supported languages.

pub mod language;

pub use language::{classify, DetectedLanguage, LanguageDetector, WhatlangDetector};
