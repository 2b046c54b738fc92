//! Desktop implementations of the preview capabilities.

use async_trait::async_trait;
use medium_preview_core::clipboard::{ClipboardError, ClipboardPayload, HtmlClipboard, Notifier};
use medium_preview_core::document::{is_markdown_path, DocumentSource};
use medium_preview_core::render::rules::escape_html;
use medium_preview_core::sync::PreviewPanel;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The focused Markdown file, shared between the event loop and the preview.
#[derive(Debug, Clone, Default)]
pub struct FileDocument {
    active: Rc<RefCell<Option<PathBuf>>>,
}

impl FileDocument {
    pub fn focus(&self, path: PathBuf) {
        *self.active.borrow_mut() = Some(path);
    }

    pub fn blur(&self) {
        *self.active.borrow_mut() = None;
    }

    pub fn active_path(&self) -> Option<PathBuf> {
        self.active.borrow().clone()
    }
}

impl DocumentSource for FileDocument {
    fn current_text(&self) -> Option<String> {
        let path = self.active_path()?;
        if !is_markdown_path(&path) {
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "Failed to read document");
                None
            }
        }
    }
}

/// Panel backed by a standalone HTML page, rewritten on every update.
pub struct HtmlFilePanel {
    path: PathBuf,
    title: String,
    html: String,
}

impl HtmlFilePanel {
    pub fn new(path: PathBuf, title: &str) -> Self {
        Self {
            path,
            title: title.to_string(),
            html: String::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
            escape_html(&self.title),
            self.html
        )
    }
}

impl PreviewPanel for HtmlFilePanel {
    fn set_inner_html(&mut self, html: &str) {
        self.html = html.to_string();
        if let Err(err) = std::fs::write(&self.path, self.page()) {
            tracing::warn!(
                error = %err,
                path = %self.path.display(),
                "Failed to write preview page"
            );
        }
    }

    fn inner_html(&self) -> &str {
        &self.html
    }
}

fn to_clipboard_error(err: arboard::Error) -> ClipboardError {
    match err {
        arboard::Error::ClipboardNotSupported => ClipboardError::Unsupported,
        err => ClipboardError::Other(err.to_string()),
    }
}

/// System clipboard through `arboard`.
///
/// A fresh handle is opened per write, the process keeps serving the content.
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[async_trait]
impl HtmlClipboard for SystemClipboard {
    async fn write_html(&self, payload: &ClipboardPayload) -> Result<(), ClipboardError> {
        let mut clipboard = arboard::Clipboard::new().map_err(to_clipboard_error)?;
        clipboard
            .set_html(payload.as_html(), payload.alt_text())
            .map_err(to_clipboard_error)
    }
}

/// Prints notices to stderr.
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}
