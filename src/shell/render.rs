//! Text rendering of session state and cycle results

use std::io::{self, Write};

use crate::session::{CycleOutcome, Session};

/// One-line summary of the displayed image
pub fn image_summary(session: &Session) -> String {
    match session.display_image() {
        Some(display) => format!(
            "Image: {}x{}, rotation {}° (slider {}°)",
            display.width(),
            display.height(),
            session.rotation_angle(),
            session.slider_position()
        ),
        None => "No image loaded".to_string(),
    }
}

/// Print the results of one cycle
pub fn outcome<W: Write>(out: &mut W, outcome: &CycleOutcome) -> io::Result<()> {
    for error in &outcome.errors {
        writeln!(out, "Error: {}", error)?;
    }

    if let Some(report) = &outcome.report {
        if !report.text.is_empty() {
            writeln!(out, "Recognized text:")?;
            writeln!(out, "{}", report.text)?;
        }
    }

    for notice in &outcome.notices {
        writeln!(out, "{}", notice)?;
    }

    if let Some(report) = &outcome.report {
        writeln!(out, "Inference time: {:.2} s", report.elapsed.as_secs_f64())?;
    }

    Ok(())
}

/// Print the full session state
pub fn status<W: Write>(out: &mut W, session: &Session) -> io::Result<()> {
    writeln!(out, "{}", image_summary(session))?;
    if let Some(source) = session.source_image() {
        writeln!(out, "Source: {}x{}", source.width(), source.height())?;
    }

    match session.extracted_text() {
        Some(text) if !text.is_empty() => writeln!(out, "Text: {}", text)?,
        Some(_) => writeln!(out, "Text: (none recognized)")?,
        None => writeln!(out, "Text: (not run)")?,
    }

    match session.detected_language() {
        Some(language) => writeln!(
            out,
            "Language: {}",
            language.label().unwrap_or(language.code())
        )?,
        None => writeln!(out, "Language: -")?,
    }

    if let Some(elapsed) = session.last_elapsed() {
        writeln!(out, "Inference time: {:.2} s", elapsed.as_secs_f64())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::tests::sample_image;

    #[test]
    fn test_image_summary() {
        let mut session = Session::default();
        assert_eq!(image_summary(&session), "No image loaded");

        session.set_image(sample_image(4, 2));
        session.rotate_left();
        session.rotate_left();
        session.rotate_left();
        assert_eq!(
            image_summary(&session),
            "Image: 2x4, rotation 270° (slider -90°)"
        );
    }

    #[test]
    fn test_status_before_recognition() {
        let session = Session::default();
        let mut out = Vec::new();
        status(&mut out, &session).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No image loaded"));
        assert!(text.contains("Text: (not run)"));
        assert!(text.contains("Language: -"));
    }
}
