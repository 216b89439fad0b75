//! Interactive shell over one [`TranslationSession`].
//!
//! Plain lines are submitted through the current mode's entry path; lines
//! starting with `:` are commands. Every submit is awaited before the next
//! prompt, so the shell never races itself.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use linguistdoc_core::{
    Mode, ParseModeError, SubmitOutcome, TranslationSession, normalize_source_language,
};

use crate::output::{self, ColorMode};

/// Terminates a `:paste` block.
const PASTE_END: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Mode(Mode),
    Toggle,
    Open(PathBuf),
    Paste,
    Lang(String),
    Show,
    Copy,
    Clear,
    Help,
    Quit,
    /// A plain input line.
    Submit(String),
    Empty,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(ShellCommand::Empty);
    }
    let Some(rest) = trimmed.strip_prefix(':') else {
        return Ok(ShellCommand::Submit(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "mode" | "m" => arg
            .parse()
            .map(ShellCommand::Mode)
            .map_err(|e: ParseModeError| e.to_string()),
        "toggle" | "t" => Ok(ShellCommand::Toggle),
        "open" | "o" if arg.is_empty() => Err("usage: :open <path>".to_string()),
        "open" | "o" => Ok(ShellCommand::Open(PathBuf::from(arg))),
        "paste" | "p" => Ok(ShellCommand::Paste),
        "lang" | "l" => Ok(ShellCommand::Lang(arg.to_string())),
        "show" | "s" => Ok(ShellCommand::Show),
        "copy" | "y" => Ok(ShellCommand::Copy),
        "clear" | "c" => Ok(ShellCommand::Clear),
        "help" | "h" | "?" => Ok(ShellCommand::Help),
        "quit" | "q" | "exit" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command ':{other}' (try :help)")),
    }
}

/// Collect lines until one holding only `.` or end of input. `None` when
/// input ended before anything was entered.
pub async fn read_paste<R>(lines: &mut Lines<R>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut collected: Vec<String> = Vec::new();
    let mut terminated = false;
    while let Some(line) = lines.next_line().await? {
        if line.trim() == PASTE_END {
            terminated = true;
            break;
        }
        collected.push(line);
    }
    if collected.is_empty() && !terminated {
        return Ok(None);
    }
    Ok(Some(collected.join("\n")))
}

pub async fn run(
    session: Arc<TranslationSession>,
    mut hint: String,
    color: ColorMode,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    output::print_mode(&mut stdout, session.mode(), &session.state().source_language, color)?;
    writeln!(stdout, "Type :help for commands.")?;

    loop {
        write!(stdout, "{}> ", session.mode().label())?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(stdout)?;
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                output::print_notice(&mut stdout, &message, color)?;
                continue;
            }
        };

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Quit => break,
            ShellCommand::Help => output::print_shell_help(&mut stdout, color)?,
            ShellCommand::Show => {
                output::print_snapshot(&mut stdout, &session.snapshot(), color)?
            }
            ShellCommand::Copy => {
                let translated = session.state().translated_text;
                if translated.is_empty() {
                    output::print_notice(&mut stdout, "Nothing to copy yet.", color)?;
                } else {
                    output::write_clipboard(&mut stdout, &translated)?;
                    output::print_notice(&mut stdout, "Copied translation to clipboard.", color)?;
                }
            }
            ShellCommand::Clear => {
                session.clear();
                session.set_source_language(&hint);
                output::print_notice(&mut stdout, "Cleared.", color)?;
            }
            ShellCommand::Mode(mode) => switch_mode(&session, mode, &hint, color)?,
            ShellCommand::Toggle => switch_mode(&session, session.mode().toggle(), &hint, color)?,
            ShellCommand::Lang(language) => {
                hint = normalize_source_language(&language);
                session.set_source_language(&hint);
                output::print_mode(&mut stdout, session.mode(), &hint, color)?;
            }
            ShellCommand::Paste => {
                if session.mode() != Mode::Text {
                    output::print_notice(
                        &mut stdout,
                        "Pasting text needs text mode (:mode text).",
                        color,
                    )?;
                    continue;
                }
                writeln!(stdout, "Enter text, then a line with only '{PASTE_END}':")?;
                if let Some(text) = read_paste(&mut lines).await? {
                    translate_text(&session, &text, color).await?;
                }
            }
            ShellCommand::Open(path) => {
                if session.mode() != Mode::Document {
                    output::print_notice(
                        &mut stdout,
                        "Opening a PDF needs document mode (:mode document).",
                        color,
                    )?;
                    continue;
                }
                translate_document(&session, path, color).await?;
            }
            ShellCommand::Submit(line) => match session.mode() {
                Mode::Text => translate_text(&session, &line, color).await?,
                Mode::Document => {
                    translate_document(&session, PathBuf::from(line.trim()), color).await?
                }
            },
        }
    }
    Ok(())
}

fn switch_mode(
    session: &TranslationSession,
    mode: Mode,
    hint: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    session.switch_mode(mode);
    session.set_source_language(hint);
    output::print_mode(&mut std::io::stdout(), mode, hint, color)
}

async fn translate_text(
    session: &TranslationSession,
    text: &str,
    color: ColorMode,
) -> anyhow::Result<()> {
    let outcome = crate::submit_with_spinner(session, session.submit_text(text)).await;
    render_outcome(session, outcome, color)
}

async fn translate_document(
    session: &TranslationSession,
    path: PathBuf,
    color: ColorMode,
) -> anyhow::Result<()> {
    let upload = match crate::load_upload(&path) {
        Ok(upload) => upload,
        Err(e) => {
            output::print_notice(&mut std::io::stdout(), &e.to_string(), color)?;
            return Ok(());
        }
    };
    let outcome = crate::submit_with_spinner(session, session.submit_document(upload)).await;
    render_outcome(session, outcome, color)
}

fn render_outcome(
    session: &TranslationSession,
    outcome: SubmitOutcome,
    color: ColorMode,
) -> anyhow::Result<()> {
    match outcome {
        SubmitOutcome::Translated(_) | SubmitOutcome::Failed(_) => {
            output::print_snapshot(&mut std::io::stdout(), &session.snapshot(), color)?;
        }
        SubmitOutcome::Ignored(_) | SubmitOutcome::Superseded => {}
    }
    Ok(())
}
