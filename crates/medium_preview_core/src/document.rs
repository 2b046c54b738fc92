//! Source documents and the capability that supplies them.

use std::path::Path;

/// Lowercase extensions of documents the preview can render.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkdn", "mkd"];

/// Check whether a path names a Markdown document (case-insensitive).
///
/// # Examples
///
/// ```
/// use medium_preview_core::document::is_markdown_path;
/// use std::path::Path;
///
/// assert!(is_markdown_path(Path::new("post.MD")));
/// assert!(!is_markdown_path(Path::new("notes.txt")));
/// ```
pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            MARKDOWN_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Read access to the host's active document.
///
/// Every call returns a fresh snapshot of the full text, or `None` when no
/// compatible document is focused. The core never keeps a reference into the
/// host document.
pub trait DocumentSource {
    fn current_text(&self) -> Option<String>;
}

impl<F> DocumentSource for F
where
    F: Fn() -> Option<String>,
{
    fn current_text(&self) -> Option<String> {
        self()
    }
}
