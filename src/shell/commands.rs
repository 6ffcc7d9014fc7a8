//! Command parsing for the interactive shell

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "textlens", no_binary_name = true, disable_version_flag = true)]
struct CommandLine {
    #[command(subcommand)]
    command: Command,
}

/// A single shell command
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a PNG or JPEG image
    Open {
        /// Path to the image file
        path: PathBuf,
    },
    /// Rotate 90 degrees counter-clockwise
    Left,
    /// Rotate 90 degrees clockwise
    Right,
    /// Set the rotation slider (-180 to 180 degrees)
    Rotate {
        /// Counter-clockwise angle in degrees
        #[arg(allow_negative_numbers = true)]
        degrees: i64,
    },
    /// Remove the current image
    Clear,
    /// Recognize text in the displayed image
    Ocr,
    /// Write the displayed image to a file
    Save {
        /// Output path; the format follows the extension
        path: PathBuf,
    },
    /// Show the session state
    Status,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Parse one input line into a command
pub fn parse_command(line: &str) -> Result<Command, clap::Error> {
    CommandLine::try_parse_from(line.split_whitespace()).map(|parsed| parsed.command)
}
