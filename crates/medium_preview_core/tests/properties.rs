use medium_preview_core::clipboard::{ClipboardError, SelectionSurface};
use medium_preview_core::config::PanelConfig;
use medium_preview_core::{
    to_html, ClipboardInjector, ClipboardPayload, CopyOutcome, HtmlClipboard, Notifier,
    PreviewController, PreviewPanel, PreviewView, RenderMode, Trigger, TriggerBus,
};
use std::cell::RefCell;
use std::rc::Rc;

const SAMPLE: &str = r#"# Writing for Medium

Some **bold** and *italic* text with a [link](https://example.com).

> Quoted wisdom

### Steps

5. Open the editor
6. Paste

1. Again
2. From one

- bullet
- list

```rust
fn main() {
    let greeting = "<hello & 'bye'>";

    println!("{greeting}");
}
```

---

    indented code
"#;

const MODES: [RenderMode; 2] = [RenderMode::Preview, RenderMode::Clipboard];

fn strip_tags(html: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

fn unescape(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn pre_blocks(html: &str) -> Vec<&str> {
    html.split("<pre").skip(1).collect()
}

#[test]
fn rendering_is_deterministic() {
    for mode in MODES {
        assert_eq!(to_html(SAMPLE, mode), to_html(SAMPLE, mode));
    }
}

#[test]
fn modes_carry_the_same_text() {
    let preview = to_html(SAMPLE, RenderMode::Preview);
    let clipboard = to_html(SAMPLE, RenderMode::Clipboard);
    assert_ne!(preview, clipboard);
    assert_eq!(strip_tags(&preview), strip_tags(&clipboard));
}

#[test]
fn blank_code_line_stays_in_one_block() {
    let source = "```\nfirst\n\nsecond\n```\n";
    for mode in MODES {
        let html = to_html(source, mode);
        assert_eq!(pre_blocks(&html).len(), 1, "{html}");
        assert!(html.contains(">first\n&nbsp;\nsecond</pre>"), "{html}");
    }
}

#[test]
fn headings_are_bold_in_both_modes() {
    let source = "# One\n## Two\n### Three\n###### Six";
    for mode in MODES {
        let html = to_html(source, mode);
        assert_eq!(html.matches("<strong style=\"font-weight: bold;\">").count(), 4);
        assert_eq!(html.matches("<h3>").count(), 2);
        assert_eq!(html.matches("<h4>").count(), 2);
        assert!(!html.contains("<h1"));
    }
}

#[test]
fn blockquote_has_no_inner_paragraph() {
    for mode in MODES {
        assert_eq!(to_html("> hello", mode), "<blockquote>hello</blockquote>\n");
    }
}

#[test]
fn missing_language_falls_back() {
    let source = "```\nx\n```";
    assert!(to_html(source, RenderMode::Preview).contains("class=\"language-plaintext\""));
    assert!(to_html(source, RenderMode::Clipboard).contains("data-code-block-lang=\"plaintext\""));
}

#[test]
fn clipboard_code_block_has_no_styling() {
    let html = to_html("```js\nx\n```", RenderMode::Clipboard);
    assert_eq!(html, "<pre data-code-block-lang=\"js\">x</pre>\n");
    assert!(!html.contains("style="));
    assert!(!html.contains("class="));
}

#[test]
fn code_escaping_round_trips() {
    let code = "if a < b && c > \"d\" {\nlet s = 'e';\n}";
    let source = format!("```c\n{code}\n```\n");
    for mode in MODES {
        let html = to_html(&source, mode);
        let body = html
            .split_once("\">")
            .and_then(|(_, rest)| rest.split_once("</pre>"))
            .map(|(body, _)| body)
            .unwrap();
        assert!(body.contains("&lt;") && body.contains("&amp;&amp;"));
        assert!(body.contains("&gt;") && body.contains("&quot;d&quot;"));
        assert!(body.contains("&#39;e&#39;"));
        assert!(!body.contains('<') && !body.contains('"') && !body.contains('\''));
        assert_eq!(unescape(body).lines().collect::<Vec<_>>(), code.lines().collect::<Vec<_>>());
    }
}

#[test]
fn ordered_list_start_attribute() {
    for mode in MODES {
        let html = to_html("5. five\n6. six", mode);
        assert!(html.starts_with("<ol start=\"5\">"), "{html}");

        let html = to_html("1. one\n2. two", mode);
        assert!(html.starts_with("<ol>\n"), "{html}");
        assert!(!html.contains("start="));
    }
}

#[derive(Default)]
struct RecordingPanel {
    html: String,
}

impl PreviewPanel for RecordingPanel {
    fn set_inner_html(&mut self, html: &str) {
        self.html = html.to_string();
    }

    fn inner_html(&self) -> &str {
        &self.html
    }
}

#[derive(Default)]
struct Notices(RefCell<Vec<String>>);

impl Notifier for Notices {
    fn notify(&self, message: &str) {
        self.0.borrow_mut().push(message.to_string());
    }
}

struct OkClipboard;

#[async_trait::async_trait]
impl HtmlClipboard for OkClipboard {
    async fn write_html(&self, _payload: &ClipboardPayload) -> Result<(), ClipboardError> {
        Ok(())
    }
}

struct DeniedClipboard;

#[async_trait::async_trait]
impl HtmlClipboard for DeniedClipboard {
    async fn write_html(&self, _payload: &ClipboardPayload) -> Result<(), ClipboardError> {
        Err(ClipboardError::PermissionDenied("not allowed".into()))
    }
}

struct BrokenSurface;

impl SelectionSurface for BrokenSurface {
    fn mount(&mut self, _html: &str) -> Result<(), ClipboardError> {
        Ok(())
    }

    fn select_contents(&mut self) -> Result<(), ClipboardError> {
        Err(ClipboardError::Selection("no range".into()))
    }

    fn exec_copy(&mut self) -> Result<(), ClipboardError> {
        Ok(())
    }

    fn clear_selection(&mut self) {}

    fn unmount(&mut self) {}
}

type Doc = Rc<RefCell<Option<String>>>;

fn view_for(doc: &Doc) -> PreviewView<impl Fn() -> Option<String>, RecordingPanel> {
    let doc = doc.clone();
    let source = move || doc.borrow().clone();
    PreviewView::new(PreviewController::new(
        source,
        RecordingPanel::default(),
        PanelConfig::default(),
    ))
}

#[tokio::test]
async fn copy_leaves_panel_untouched() {
    let doc: Doc = Rc::new(RefCell::new(Some(SAMPLE.to_string())));
    let mut bus = TriggerBus::default();
    let mut view = view_for(&doc);
    view.open(&mut bus);
    let before = view.controller().panel().inner_html().to_string();

    let injectors = [
        ClipboardInjector::new(Some(Box::new(OkClipboard)), None),
        ClipboardInjector::new(Some(Box::new(DeniedClipboard)), None),
        ClipboardInjector::new(None, Some(Box::new(BrokenSurface))),
    ];

    for mut injector in injectors {
        let notices = Notices::default();
        let outcome = view.copy(&mut injector, &notices).await;
        assert!(outcome.is_some());
        assert_eq!(notices.0.borrow().len(), 1);
        assert_eq!(view.controller().panel().inner_html(), before);
    }
}

#[tokio::test]
async fn copy_without_any_render_notifies() {
    let doc: Doc = Rc::default();
    let view = view_for(&doc);
    let notices = Notices::default();
    let mut injector = ClipboardInjector::new(Some(Box::new(OkClipboard)), None);

    assert!(view.copy(&mut injector, &notices).await.is_none());
    assert_eq!(notices.0.borrow().as_slice(), &["No content to copy.".to_string()]);
}

#[tokio::test]
async fn copy_after_focus_loss_uses_last_snapshot() {
    let doc: Doc = Rc::new(RefCell::new(Some("**kept**".to_string())));
    let mut bus = TriggerBus::default();
    let mut view = view_for(&doc);
    view.open(&mut bus);

    *doc.borrow_mut() = None;
    bus.emit(Trigger::FocusChanged);

    let mut injector = ClipboardInjector::new(Some(Box::new(OkClipboard)), None);
    let outcome = view.copy(&mut injector, &Notices::default()).await;
    assert!(matches!(outcome, Some(CopyOutcome::Copied(_))));
    assert!(view.controller().panel().inner_html().contains("kept"));
}

#[test]
fn focus_loss_preserves_panel_and_placeholder_is_single() {
    let doc: Doc = Rc::default();
    let mut bus = TriggerBus::default();
    let mut view = view_for(&doc);

    view.open(&mut bus);
    bus.emit(Trigger::FocusChanged);
    bus.emit(Trigger::DocumentEdited);
    let placeholder = view.controller().panel().inner_html().to_string();
    assert_eq!(
        placeholder.matches("Open a Markdown file to see the Medium preview.").count(),
        1
    );

    *doc.borrow_mut() = Some("hello".into());
    bus.emit(Trigger::FocusChanged);
    let rendered = view.controller().panel().inner_html().to_string();
    assert!(rendered.contains("<p>hello</p>"));
    assert!(!rendered.contains("medium-preview-placeholder"));

    *doc.borrow_mut() = None;
    bus.emit(Trigger::FocusChanged);
    assert_eq!(view.controller().panel().inner_html(), rendered);

    view.close(&mut bus);
}
