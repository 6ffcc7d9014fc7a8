//! Session State Controller
//!
//! Per-user state for one interaction lifetime: the uploaded image, its
//! rotation, the derived display image and the last recognition results.
//! Sessions share nothing; the OCR engine and language detector are passed
//! in by reference and can be shared between sessions.

pub mod cycle;
pub mod error;
pub mod messages;
pub mod state;

pub use cycle::{CycleOutcome, UiCycle};
pub use error::SessionError;
pub use messages::Notice;
pub use state::{RecognitionReport, Session, SessionOptions};
