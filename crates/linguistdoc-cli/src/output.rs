use std::io::Write;

use linguistdoc_core::{AUTO_DETECT, ExtractionSummary, FileMetadata, Mode, SessionSnapshot};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn heading(w: &mut dyn Write, text: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", text.bold())
    } else {
        writeln!(w, "{}", text)
    }
}

/// Print the mode line shown when the shell starts or the mode changes.
pub fn print_mode(
    w: &mut dyn Write,
    mode: Mode,
    source_language: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    let language = if source_language == AUTO_DETECT {
        "Detecting Language...".to_string()
    } else {
        format!("Source: {}", source_language)
    };
    if color.enabled() {
        writeln!(
            w,
            "{} {}",
            mode.label().cyan().bold(),
            format!("({})", language).dimmed()
        )
    } else {
        writeln!(w, "{} ({})", mode.label(), language)
    }
}

/// Print the extraction summary after PDF parsing.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    document: &FileMetadata,
    summary: &ExtractionSummary,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(
        w,
        "Extracted {} of {} pages from {}",
        summary.pages_processed, summary.total_pages, document.name
    )?;
    if summary.truncated {
        let note = format!(
            "(Only the first {} pages are translated)",
            summary.pages_processed
        );
        if color.enabled() {
            writeln!(w, "{}", note.dimmed())?;
        } else {
            writeln!(w, "{}", note)?;
        }
    }
    Ok(())
}

/// Print the translation result or error held by a snapshot.
pub fn print_snapshot(
    w: &mut dyn Write,
    snapshot: &SessionSnapshot,
    color: ColorMode,
) -> std::io::Result<()> {
    if let (Some(document), Some(summary)) = (&snapshot.document, &snapshot.extraction) {
        print_extraction_summary(w, document, summary, color)?;
        writeln!(w)?;
    }

    let state = &snapshot.state;
    if let Some(error) = &state.error {
        if color.enabled() {
            writeln!(w, "{}", error.red().bold())?;
        } else {
            writeln!(w, "Error: {}", error)?;
        }
        writeln!(w)?;
    }

    heading(w, "English (Final)", color)?;
    if state.translated_text.is_empty() {
        let placeholder = match snapshot.mode {
            Mode::Text => "Translation will appear here...",
            Mode::Document => "Waiting for document processing...",
        };
        if color.enabled() {
            writeln!(w, "{}", placeholder.dimmed().italic())?;
        } else {
            writeln!(w, "{}", placeholder)?;
        }
    } else {
        writeln!(w, "{}", state.translated_text)?;
    }
    Ok(())
}

/// Copy text to the terminal's clipboard via the OSC 52 escape sequence.
pub fn write_clipboard(w: &mut dyn Write, text: &str) -> std::io::Result<()> {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    write!(w, "\x1b]52;c;{}\x07", encoded)?;
    w.flush()
}

/// Print a one-line shell notice that does not touch session state.
pub fn print_notice(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", message.yellow())
    } else {
        writeln!(w, "{}", message)
    }
}

pub fn print_shell_help(w: &mut dyn Write, color: ColorMode) -> std::io::Result<()> {
    heading(w, "Commands", color)?;
    let rows = [
        (":mode text|document", "switch entry path (clears the current translation)"),
        (":toggle", "switch to the other mode"),
        (":open <path>", "translate a PDF (document mode)"),
        (":paste", "enter multi-line text, finish with a line containing only '.'"),
        (":lang <language>", "set the source language hint (empty = auto-detect)"),
        (":show", "show the current translation"),
        (":copy", "copy the current translation to the clipboard"),
        (":clear", "clear the current translation"),
        (":quit", "leave the shell"),
    ];
    for (command, description) in rows {
        if color.enabled() {
            writeln!(w, "  {:<22} {}", command.cyan(), description)?;
        } else {
            writeln!(w, "  {:<22} {}", command, description)?;
        }
    }
    writeln!(
        w,
        "Any other line is translated in text mode, or opened as a PDF path in document mode."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use linguistdoc_core::TranslationState;

    fn snapshot(state: TranslationState, mode: Mode) -> SessionSnapshot {
        SessionSnapshot {
            state,
            mode,
            phase: None,
            document: None,
            extraction: None,
            generation: 0,
        }
    }

    fn render(snap: &SessionSnapshot) -> String {
        let mut buf = Vec::new();
        print_snapshot(&mut buf, snap, ColorMode(false)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn placeholder_depends_on_mode() {
        let text = render(&snapshot(TranslationState::default(), Mode::Text));
        assert!(text.contains("Translation will appear here..."));
        let doc = render(&snapshot(TranslationState::default(), Mode::Document));
        assert!(doc.contains("Waiting for document processing..."));
    }

    #[test]
    fn error_shown_above_stale_translation() {
        let state = TranslationState {
            translated_text: "Earlier result".into(),
            error: Some("Failed to translate text.".into()),
            ..TranslationState::default()
        };
        let out = render(&snapshot(state, Mode::Text));
        let err_pos = out.find("Error: Failed to translate text.").unwrap();
        let text_pos = out.find("Earlier result").unwrap();
        assert!(err_pos < text_pos);
    }

    #[test]
    fn truncated_document_summary() {
        let mut snap = snapshot(TranslationState::default(), Mode::Document);
        snap.document = Some(FileMetadata {
            name: "big.pdf".into(),
            size: 1,
            content_type: "application/pdf".into(),
        });
        snap.extraction = Some(ExtractionSummary {
            pages_processed: 10,
            total_pages: 42,
            truncated: true,
        });
        let out = render(&snap);
        assert!(out.contains("Extracted 10 of 42 pages from big.pdf"));
        assert!(out.contains("Only the first 10 pages"));
    }

    #[test]
    fn mode_line_shows_hint() {
        let mut buf = Vec::new();
        print_mode(&mut buf, Mode::Text, AUTO_DETECT, ColorMode(false)).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Text Translate (Detecting Language...)\n"
        );

        let mut buf = Vec::new();
        print_mode(&mut buf, Mode::Document, "Korean", ColorMode(false)).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "PDF Translate (Source: Korean)\n"
        );
    }

    #[test]
    fn clipboard_escape_wraps_base64() {
        let mut buf = Vec::new();
        write_clipboard(&mut buf, "Hello world").unwrap();
        assert_eq!(buf, b"\x1b]52;c;SGVsbG8gd29ybGQ=\x07");
    }
}
