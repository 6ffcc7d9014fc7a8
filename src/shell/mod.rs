//! Interactive shell
//!
//! A line-oriented front end for one session. Each command becomes one
//! [`UiCycle`]; results are rendered as plain text.

pub mod commands;
pub mod render;

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analysis::LanguageDetector;
use crate::session::{Notice, Session, UiCycle};
use crate::vision::TextRecognizer;

pub use commands::{parse_command, Command};

/// Shell bound to one session and the shared engines
pub struct Shell<R, W> {
    session: Session,
    recognizer: Arc<dyn TextRecognizer>,
    detector: Arc<dyn LanguageDetector>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Create a shell reading commands from `input`
    pub fn new(
        session: Session,
        recognizer: Arc<dyn TextRecognizer>,
        detector: Arc<dyn LanguageDetector>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            session,
            recognizer,
            detector,
            input,
            output,
        }
    }

    /// The session driven by this shell
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Read and execute commands until `quit` or end of input
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "textlens ready. Type 'help' for commands.")?;

        let mut line = String::new();
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match parse_command(trimmed) {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command)?,
                Err(e) => write!(self.output, "{}", e)?,
            }
        }

        info!("Shell closed");
        Ok(())
    }

    /// Execute one command
    pub fn execute(&mut self, command: Command) -> Result<()> {
        let shows_image = matches!(
            command,
            Command::Open { .. } | Command::Left | Command::Right | Command::Rotate { .. }
        );

        let cycle = match command {
            Command::Open { path } => match std::fs::read(&path) {
                Ok(bytes) => UiCycle::upload(bytes),
                Err(e) => {
                    warn!("Cannot read {:?}: {}", path, e);
                    writeln!(self.output, "Error: cannot read {}: {}", path.display(), e)?;
                    return Ok(());
                }
            },
            Command::Left => UiCycle::rotate_left(),
            Command::Right => UiCycle::rotate_right(),
            Command::Rotate { degrees } => UiCycle::slider(degrees),
            Command::Clear => UiCycle::clear(),
            Command::Ocr => UiCycle::recognize(),
            Command::Save { path } => return self.save_display(&path),
            Command::Status => {
                render::status(&mut self.output, &self.session)?;
                return Ok(());
            }
            Command::Quit => return Ok(()),
        };

        let outcome = self.session.process_cycle(
            cycle,
            self.recognizer.as_ref(),
            self.detector.as_ref(),
        );
        render::outcome(&mut self.output, &outcome)?;

        if shows_image && self.session.has_image() {
            writeln!(self.output, "{}", render::image_summary(&self.session))?;
        }

        Ok(())
    }

    fn save_display(&mut self, path: &Path) -> Result<()> {
        let Some(display) = self.session.display_image() else {
            writeln!(self.output, "{}", Notice::UploadPrompt)?;
            return Ok(());
        };

        match display.save(path) {
            Ok(()) => {
                info!("Saved display image to {:?}", path);
                writeln!(self.output, "Saved {}", path.display())?;
            }
            Err(e) => writeln!(self.output, "Error: cannot save {}: {}", path.display(), e)?,
        }
        Ok(())
    }
}
