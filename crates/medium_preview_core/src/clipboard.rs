//! Rich-text clipboard injection.
//!
//! The preferred path hands a `text/html` payload straight to the platform
//! clipboard. When that capability is missing or reports
//! [`ClipboardError::Unsupported`], the HTML is mounted into a transient
//! offscreen node, selected, and copied with the platform copy command. The
//! transient node is always removed again, whatever happened in between.

use async_trait::async_trait;

/// MIME type of the rich-text payload.
pub const HTML_MIME_TYPE: &str = "text/html";

pub const COPY_SUCCESS_NOTICE: &str = "Medium-compatible content copied to clipboard!";
pub const NOTHING_TO_COPY_NOTICE: &str = "No content to copy.";

/// Error type for clipboard operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// No direct clipboard write on this platform, and no fallback either.
    #[error("rich-text clipboard is not supported on this platform")]
    Unsupported,

    /// The platform refused access to the clipboard.
    #[error("clipboard access denied: {0}")]
    PermissionDenied(String),

    /// Selecting the transient node failed.
    #[error("failed to select content: {0}")]
    Selection(String),

    /// The platform copy command failed.
    #[error("copy command failed: {0}")]
    CopyCommand(String),

    #[error("{0}")]
    Other(String),
}

/// A MIME-tagged HTML payload. Built per copy and dropped right after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    html: String,
    alt_text: Option<String>,
}

impl ClipboardPayload {
    pub fn html(html: String) -> Self {
        Self {
            html,
            alt_text: None,
        }
    }

    /// Attach a `text/plain` alternative for targets without rich-text paste.
    pub fn with_alt_text(mut self, alt_text: String) -> Self {
        self.alt_text = Some(alt_text);
        self
    }

    pub fn mime_type(&self) -> &'static str {
        HTML_MIME_TYPE
    }

    pub fn as_html(&self) -> &str {
        &self.html
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.html.as_bytes()
    }

    pub fn alt_text(&self) -> Option<&str> {
        self.alt_text.as_deref()
    }
}

/// Direct clipboard write capability.
#[async_trait]
pub trait HtmlClipboard: Send + Sync {
    async fn write_html(&self, payload: &ClipboardPayload) -> Result<(), ClipboardError>;
}

/// Selection-based copy against a transient node, used as the fallback.
///
/// `unmount` and `clear_selection` must be safe to call even if `mount`
/// failed half way.
pub trait SelectionSurface {
    fn mount(&mut self, html: &str) -> Result<(), ClipboardError>;
    fn select_contents(&mut self) -> Result<(), ClipboardError>;
    fn exec_copy(&mut self) -> Result<(), ClipboardError>;
    fn clear_selection(&mut self);
    fn unmount(&mut self);
}

/// Fire-and-forget user notice.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Which path delivered the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    Direct,
    Selection,
}

#[derive(Debug)]
pub enum CopyOutcome {
    Copied(CopyPath),
    Failed(ClipboardError),
}

impl CopyOutcome {
    pub fn is_copied(&self) -> bool {
        matches!(self, Self::Copied(_))
    }
}

/// Removes the transient node when dropped.
struct TransientNode<'a> {
    surface: &'a mut dyn SelectionSurface,
}

impl Drop for TransientNode<'_> {
    fn drop(&mut self) {
        self.surface.clear_selection();
        self.surface.unmount();
    }
}

fn copy_via_selection(
    surface: &mut dyn SelectionSurface,
    html: &str,
) -> Result<(), ClipboardError> {
    let node = TransientNode { surface };
    node.surface.mount(html)?;
    node.surface.select_contents()?;
    node.surface.exec_copy()
}

/// Hands clipboard-mode HTML to whichever clipboard path is available.
pub struct ClipboardInjector {
    clipboard: Option<Box<dyn HtmlClipboard>>,
    fallback: Option<Box<dyn SelectionSurface>>,
    plain_text_alternative: bool,
}

impl Default for ClipboardInjector {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl ClipboardInjector {
    pub fn new(
        clipboard: Option<Box<dyn HtmlClipboard>>,
        fallback: Option<Box<dyn SelectionSurface>>,
    ) -> Self {
        Self {
            clipboard,
            fallback,
            plain_text_alternative: true,
        }
    }

    pub fn plain_text_alternative(mut self, enabled: bool) -> Self {
        self.plain_text_alternative = enabled;
        self
    }

    async fn try_copy(&mut self, payload: &ClipboardPayload) -> Result<CopyPath, ClipboardError> {
        if let Some(clipboard) = &self.clipboard {
            match clipboard.write_html(payload).await {
                Ok(()) => return Ok(CopyPath::Direct),
                Err(ClipboardError::Unsupported) => {
                    tracing::debug!("Direct clipboard write unsupported, using selection copy");
                }
                Err(err) => return Err(err),
            }
        }

        let surface = self
            .fallback
            .as_deref_mut()
            .ok_or(ClipboardError::Unsupported)?;
        copy_via_selection(surface, payload.as_html())?;

        Ok(CopyPath::Selection)
    }

    /// Copy the payload and report the result through `notifier`.
    ///
    /// Never fails: errors end up in the returned outcome and in the notice.
    pub async fn copy(
        &mut self,
        payload: ClipboardPayload,
        notifier: &dyn Notifier,
    ) -> CopyOutcome {
        let payload = if self.plain_text_alternative {
            payload
        } else {
            ClipboardPayload::html(payload.html)
        };

        match self.try_copy(&payload).await {
            Ok(path) => {
                tracing::info!(?path, bytes = payload.as_bytes().len(), "Copied rich text");
                notifier.notify(COPY_SUCCESS_NOTICE);
                CopyOutcome::Copied(path)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to copy rich text");
                notifier.notify(&format!("Error copying rich text to clipboard: {err}"));
                CopyOutcome::Failed(err)
            }
        }
    }
}
