//! Error types for session operations

use thiserror::Error;

/// Errors surfaced to the user by session operations.
///
/// Every variant is terminal to the triggering operation only; the session
/// state is left exactly as it was before the operation started.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The uploaded payload is not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The payload decodes but is neither PNG nor JPEG
    #[error("Unsupported image format {0}, expected PNG or JPEG")]
    UnsupportedFormat(String),

    /// The OCR engine failed on the displayed image
    /// Preserves the underlying error source for full error chain transparency
    #[error("Text recognition failed: {0}")]
    Recognition(#[source] Box<dyn std::error::Error + Send + Sync>),
}
