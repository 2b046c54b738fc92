//! Core library for the Medium preview.
//!
//! Converts Markdown into the restricted HTML that Medium's paste sanitizer
//! accepts, alongside a styled rendering for on-screen preview.
//!
//! # Modules
//!
//! - [`preprocess`] - Source normalization before parsing
//! - [`render`] - Dual-mode rendering (preview and clipboard) with the rule tables
//! - [`clipboard`] - Rich-text clipboard injection with selection fallback
//! - [`sync`] - Preview panel synchronization with the host document
//! - [`document`] - Document source capability and Markdown detection
//! - [`config`] - Startup configuration

pub mod clipboard;
pub mod config;
pub mod document;
pub mod preprocess;
pub mod render;
pub mod sync;

// Re-export commonly used types at crate root
pub use clipboard::{
    ClipboardError, ClipboardInjector, ClipboardPayload, CopyOutcome, CopyPath, HtmlClipboard,
    Notifier, SelectionSurface,
};
pub use config::{load_config, PreviewConfig};
pub use document::{is_markdown_path, DocumentSource};
pub use render::{render_both, to_html, DualRender, RenderMode};
pub use sync::{PreviewController, PreviewPanel, PreviewView, SyncState, Trigger, TriggerBus};
