use std::future::Future;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use linguistdoc_core::config_file::{self, ConfigFile, GeminiConfig, TranslationConfig};
use linguistdoc_core::{
    Config, DocumentUpload, Ignored, Mode, SubmitOutcome, TranslationSession,
    normalize_source_language,
};
use linguistdoc_pdf_mupdf::MupdfBackend;

mod output;
mod shell;

use output::ColorMode;

/// LinguistDoc - Translate text and PDF documents into English
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gemini API key (overrides GEMINI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Source language hint, e.g. "French" (default: auto-detect)
    #[arg(long, global = true)]
    source_language: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate text given as an argument or piped on stdin
    Text {
        /// Text to translate; read from stdin when omitted
        text: Option<String>,
    },

    /// Extract the text of a PDF (first 10 pages) and translate it
    Document {
        /// Path to the PDF file
        path: PathBuf,
    },

    /// Interactive session with a text/document mode toggle
    Shell {
        /// Starting mode: text or document
        #[arg(long, default_value = "text")]
        mode: Mode,
    },

    /// Save the resolved settings to the platform config file
    Init,
}

/// Settings passed on the command line.
#[derive(Debug, Default)]
struct Overrides {
    api_key: Option<String>,
    model: Option<String>,
    source_language: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    let overrides = Overrides {
        api_key: cli.api_key,
        model: cli.model,
        source_language: cli.source_language,
    };
    let config = resolve_config(&config_file::load_config(), overrides, |name| {
        std::env::var(name).ok()
    });
    tracing::debug!(?config, "resolved configuration");

    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Text { text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let session = build_session(&config, Mode::Text);
            let outcome = submit_with_spinner(&session, session.submit_text(&text)).await;
            report(&session, outcome, color)
        }
        Command::Document { path } => {
            let upload = load_upload(&path)?;
            let session = build_session(&config, Mode::Document);
            let outcome = submit_with_spinner(&session, session.submit_document(upload)).await;
            report(&session, outcome, color)
        }
        Command::Shell { mode } => {
            let session = build_session(&config, mode);
            shell::run(session, config.source_language.clone(), color).await
        }
        Command::Init => init(&config),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(
    file: &ConfigFile,
    overrides: Overrides,
    lookup: impl Fn(&str) -> Option<String>,
) -> Config {
    let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let mut config = Config::from_file(file);
    if let Some(key) = overrides
        .api_key
        .or_else(|| env("GEMINI_API_KEY"))
        .or_else(|| env("API_KEY"))
    {
        config.api_key = Some(key);
    }
    if let Some(model) = overrides.model.or_else(|| env("LINGUISTDOC_MODEL")) {
        config.model = model;
    }
    if let Some(hint) = overrides.source_language {
        config.source_language = normalize_source_language(&hint);
    }
    config
}

fn build_session(config: &Config, mode: Mode) -> Arc<TranslationSession> {
    let session = TranslationSession::new(config.build_client(), Arc::new(MupdfBackend::new()));
    session.switch_mode(mode);
    session.set_source_language(&config.source_language);
    Arc::new(session)
}

pub(crate) fn load_upload(path: &Path) -> anyhow::Result<DocumentUpload> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(DocumentUpload::from_path(path)?)
}

/// Await a submit while a spinner shows the session's busy phase.
pub(crate) async fn submit_with_spinner<F>(
    session: &TranslationSession,
    submit: F,
) -> SubmitOutcome
where
    F: Future<Output = SubmitOutcome>,
{
    let spinner = PhaseSpinner::start(session);
    let outcome = submit.await;
    spinner.stop().await;
    outcome
}

fn report(
    session: &TranslationSession,
    outcome: SubmitOutcome,
    color: ColorMode,
) -> anyhow::Result<()> {
    match outcome {
        SubmitOutcome::Translated(_) => {
            let mut stdout = std::io::stdout().lock();
            output::print_snapshot(&mut stdout, &session.snapshot(), color)?;
            Ok(())
        }
        SubmitOutcome::Failed(e) => anyhow::bail!(e.user_message()),
        SubmitOutcome::Ignored(Ignored::EmptyInput) => anyhow::bail!("Nothing to translate"),
        SubmitOutcome::Ignored(Ignored::Busy) | SubmitOutcome::Superseded => {
            anyhow::bail!("Translation was interrupted")
        }
    }
}

fn init(config: &Config) -> anyhow::Result<()> {
    let file = ConfigFile {
        gemini: Some(GeminiConfig {
            api_key: config.api_key.clone(),
            model: Some(config.model.clone()),
            base_url: Some(config.base_url.clone()),
            temperature: Some(config.temperature),
        }),
        translation: Some(TranslationConfig {
            source_language: Some(config.source_language.clone()),
        }),
    };
    let path = config_file::save_config(&file)?;
    println!("Saved configuration to {}", path.display());
    if config.api_key.is_none() {
        println!("No API key set. Pass --api-key or set GEMINI_API_KEY before translating.");
    }
    Ok(())
}

/// Spinner that follows `SessionSnapshot::phase` until stopped.
struct PhaseSpinner {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl PhaseSpinner {
    fn start(session: &TranslationSession) -> Self {
        let mut rx = session.subscribe();
        let (stop, mut stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut bar: Option<ProgressBar> = None;
            loop {
                let phase = rx.borrow_and_update().phase;
                match phase {
                    Some(phase) => bar
                        .get_or_insert_with(new_spinner)
                        .set_message(phase.label()),
                    None => {
                        if let Some(bar) = bar.take() {
                            bar.finish_and_clear();
                        }
                    }
                }

                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = &mut stopped => break,
                }
            }
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
        });

        Self { stop, task }
    }

    async fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.task.await;
    }
}

fn new_spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}").unwrap());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use linguistdoc_core::AUTO_DETECT;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn file_with_key(key: &str) -> ConfigFile {
        ConfigFile {
            gemini: Some(GeminiConfig {
                api_key: Some(key.to_string()),
                model: Some("file-model".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn flag_beats_env_and_file() {
        let overrides = Overrides {
            api_key: Some("flag-key".into()),
            ..Default::default()
        };
        let config = resolve_config(
            &file_with_key("file-key"),
            overrides,
            env_from(&[("GEMINI_API_KEY", "env-key")]),
        );
        assert_eq!(config.api_key.as_deref(), Some("flag-key"));
    }

    #[test]
    fn env_beats_file() {
        let config = resolve_config(
            &file_with_key("file-key"),
            Overrides::default(),
            env_from(&[("API_KEY", "fallback-key"), ("LINGUISTDOC_MODEL", "env-model")]),
        );
        assert_eq!(config.api_key.as_deref(), Some("fallback-key"));
        assert_eq!(config.model, "env-model");
    }

    #[test]
    fn gemini_key_preferred_over_generic_key() {
        let config = resolve_config(
            &ConfigFile::default(),
            Overrides::default(),
            env_from(&[("API_KEY", "generic"), ("GEMINI_API_KEY", "gemini")]),
        );
        assert_eq!(config.api_key.as_deref(), Some("gemini"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let config = resolve_config(
            &file_with_key("file-key"),
            Overrides::default(),
            env_from(&[("GEMINI_API_KEY", "  ")]),
        );
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.model, "file-model");
    }

    #[test]
    fn blank_language_flag_means_auto_detect() {
        let overrides = Overrides {
            source_language: Some(" ".into()),
            ..Default::default()
        };
        let config = resolve_config(&ConfigFile::default(), overrides, env_from(&[]));
        assert_eq!(config.source_language, AUTO_DETECT);
    }

    #[test]
    fn session_starts_in_requested_mode_with_hint() {
        let config = Config {
            source_language: "Spanish".into(),
            ..Config::default()
        };
        let session = build_session(&config, Mode::Document);
        assert_eq!(session.mode(), Mode::Document);
        assert_eq!(session.state().source_language, "Spanish");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_upload(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "linguistdoc",
            "shell",
            "--mode",
            "pdf",
            "--source-language",
            "Korean",
            "--no-color",
        ])
        .unwrap();
        assert!(cli.no_color);
        assert_eq!(cli.source_language.as_deref(), Some("Korean"));
        assert!(matches!(cli.command, Command::Shell { mode: Mode::Document }));
    }
}
