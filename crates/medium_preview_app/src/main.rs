//! Medium preview host.
//!
//! Keeps an HTML preview page in sync with a Markdown file and copies the
//! Medium-ready HTML to the system clipboard on request.
//!
//! # Usage
//!
//! ```bash
//! # Live preview, written to medium-preview.html
//! medium_preview post.md
//!
//! # One-shot copy to the clipboard
//! medium_preview post.md --copy
//! ```
//!
//! While running, commands are read from stdin: `copy`, `focus <file>`,
//! `blur` and `quit`.

mod host;
mod watcher;

use anyhow::{anyhow, Result};
use clap::Parser;
use host::{FileDocument, HtmlFilePanel, StderrNotifier, SystemClipboard};
use medium_preview_core::clipboard::Notifier;
use medium_preview_core::config::{load_config, LoadedConfig, LogConfig};
use medium_preview_core::{
    ClipboardInjector, CopyOutcome, PreviewController, PreviewView, Trigger, TriggerBus,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use watcher::DocumentWatcher;

const LOG_PATH_ENV: &str = "MEDIUM_PREVIEW_LOG";

/// Log files above this size are truncated on startup.
const MAX_LOG_FILE_SIZE: u64 = 8 * 1024 * 1024;

#[derive(Parser, Debug)]
#[clap(name = "medium_preview", version, about = "Live Medium preview for a Markdown file")]
pub struct Args {
    /// Markdown file to preview.
    pub file: Option<PathBuf>,

    /// Where to write the preview page.
    #[clap(long, short, default_value = "medium-preview.html")]
    pub output: PathBuf,

    /// Use a custom config file instead of the default location.
    #[clap(long)]
    pub config_file: Option<PathBuf>,

    /// Write logs to this file.
    ///
    /// Takes precedence over `MEDIUM_PREVIEW_LOG` and the `log-file` config.
    #[clap(long)]
    pub log: Option<PathBuf>,

    /// Copy the Medium HTML of FILE to the clipboard and exit.
    #[clap(long)]
    pub copy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Copy,
    Focus(PathBuf),
    Blur,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (name, arg) = line
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((line, ""));

    match (name, arg) {
        ("copy" | "c", "") => Some(Command::Copy),
        ("blur", "") => Some(Command::Blur),
        ("quit" | "q", "") => Some(Command::Quit),
        ("focus" | "f", path) if !path.is_empty() => Some(Command::Focus(PathBuf::from(path))),
        _ => None,
    }
}

#[derive(Debug, Clone)]
enum HostEvent {
    DocumentEdited,
    Input(String),
    InputClosed,
}

async fn read_commands(event_tx: UnboundedSender<HostEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if event_tx.send(HostEvent::Input(line)).is_err() {
                    break;
                }
            }
            Ok(None) | Err(_) => {
                let _ = event_tx.send(HostEvent::InputClosed);
                break;
            }
        }
    }
}

fn env_filter(log_config: &LogConfig) -> Result<EnvFilter> {
    let max_level = log_config
        .max_level
        .parse()
        .unwrap_or(tracing::Level::DEBUG)
        .as_str()
        .to_ascii_lowercase();

    let mut filter = EnvFilter::from_default_env()
        .add_directive(format!("medium_preview_app={max_level}").parse()?)
        .add_directive(format!("medium_preview_core={max_level}").parse()?);

    for target in log_config.log_target.split(',').filter(|t| !t.trim().is_empty()) {
        filter = filter.add_directive(target.trim().parse()?);
    }

    Ok(filter)
}

fn init_logging(args: &Args, log_config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let maybe_log = args
        .log
        .clone()
        .or_else(|| std::env::var(LOG_PATH_ENV).ok().map(PathBuf::from))
        .or_else(|| log_config.log_file.as_ref().map(PathBuf::from));

    let filter = env_filter(log_config)?;

    let Some(log_path) = maybe_log else {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        return Ok(None);
    };

    if let Ok(metadata) = std::fs::metadata(&log_path) {
        if log_path.is_file() && metadata.len() > MAX_LOG_FILE_SIZE {
            std::fs::remove_file(&log_path)?;
        }
    }

    let file_name = log_path
        .file_name()
        .ok_or_else(|| anyhow!("no file name in {log_path:?}"))?;

    let directory = log_path
        .parent()
        .ok_or_else(|| anyhow!("{log_path:?} has no parent"))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_line_number(true)
        .with_writer(non_blocking)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(Some(guard))
}

fn watch(
    document: &FileDocument,
    event_tx: &UnboundedSender<HostEvent>,
) -> Option<DocumentWatcher<HostEvent>> {
    let path = document.active_path()?;
    match DocumentWatcher::new(&path, event_tx.clone(), HostEvent::DocumentEdited) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            tracing::warn!(?err, path = %path.display(), "Failed to watch document");
            None
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let LoadedConfig {
        config,
        file_path,
        maybe_error,
    } = load_config(args.config_file.clone());

    let _log_guard = init_logging(&args, &config.log)?;

    tracing::info!(config_file = ?file_path, "Starting Medium preview");

    let notifier = StderrNotifier;
    if let Some(err) = maybe_error {
        notifier.notify(&format!("Invalid config.toml, using defaults: {err}"));
    }

    let document = FileDocument::default();
    if let Some(file) = args.file.clone() {
        document.focus(file);
    }

    let panel = HtmlFilePanel::new(args.output.clone(), &config.panel.title);
    let mut injector = ClipboardInjector::new(Some(Box::new(SystemClipboard)), None)
        .plain_text_alternative(config.clipboard.plain_text_alternative);

    let mut bus = TriggerBus::default();
    let mut view = PreviewView::new(PreviewController::new(
        document.clone(),
        panel,
        config.panel.clone(),
    ));
    view.open(&mut bus);

    if args.copy {
        let outcome = view.copy(&mut injector, &notifier).await;
        view.close(&mut bus);
        return match outcome {
            Some(CopyOutcome::Copied(_)) => Ok(()),
            Some(CopyOutcome::Failed(err)) => Err(err.into()),
            None => Err(anyhow!("no Markdown document to copy")),
        };
    }

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut watcher = watch(&document, &event_tx);
    tokio::spawn(read_commands(event_tx.clone()));

    notifier.notify(&format!(
        "Previewing into {}. Commands: copy, focus <file>, blur, quit",
        args.output.display()
    ));

    while let Some(event) = event_rx.recv().await {
        match event {
            HostEvent::DocumentEdited => bus.emit(Trigger::DocumentEdited),
            HostEvent::InputClosed => {
                tracing::debug!("stdin closed, watching only");
            }
            HostEvent::Input(line) => match parse_command(&line) {
                Some(Command::Copy) => {
                    view.copy(&mut injector, &notifier).await;
                }
                Some(Command::Focus(path)) => {
                    document.focus(path);
                    watcher = watch(&document, &event_tx);
                    bus.emit(Trigger::FocusChanged);
                }
                Some(Command::Blur) => {
                    document.blur();
                    watcher = None;
                    bus.emit(Trigger::FocusChanged);
                }
                Some(Command::Quit) => break,
                None if line.trim().is_empty() => {}
                None => notifier.notify(&format!("Unknown command: {}", line.trim())),
            },
        }
    }

    drop(watcher);
    view.close(&mut bus);

    tracing::info!("Medium preview stopped");

    Ok(())
}
