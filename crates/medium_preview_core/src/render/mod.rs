//! Markdown to Medium-flavoured HTML.
//!
//! The same source text renders in two [`RenderMode`]s:
//! - [`RenderMode::Preview`] for the on-screen panel (styled code blocks)
//! - [`RenderMode::Clipboard`] for pasting into Medium (sanitizer-safe markup)
//!
//! Both outputs come from their own pass over the source. The clipboard HTML
//! is never derived from the preview HTML.

pub mod rules;

use crate::preprocess::normalize_fences;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag};
use serde::{Deserialize, Serialize};

pub use rules::{RuleSet, CLIPBOARD_RULES, DEFAULT_CODE_LANGUAGE, PREVIEW_RULES};

/// Which rule variant fires for headings, code blocks and strong emphasis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Visually faithful rendering for the preview panel.
    #[default]
    Preview,
    /// Markup accepted byte-for-byte by Medium's paste sanitizer.
    Clipboard,
}

impl RenderMode {
    /// The immutable rule table for this mode.
    pub fn rules(self) -> &'static RuleSet {
        match self {
            Self::Preview => &PREVIEW_RULES,
            Self::Clipboard => &CLIPBOARD_RULES,
        }
    }
}

/// Both renderings of one source snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DualRender {
    pub preview: String,
    pub clipboard: String,
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    // Lets `{#id .class}` suffixes be parsed away instead of leaking into text.
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// Render markdown source to HTML for the given mode.
///
/// Deterministic: the output depends on nothing but `source` and `mode`.
///
/// # Example
///
/// ```
/// use medium_preview_core::render::{to_html, RenderMode};
///
/// let html = to_html("# Hello", RenderMode::Clipboard);
/// assert_eq!(html, "<h3><strong style=\"font-weight: bold;\">Hello</strong></h3>\n");
/// ```
pub fn to_html(source: &str, mode: RenderMode) -> String {
    let normalized = normalize_fences(source);
    let events: Vec<Event> = Parser::new_ext(&normalized, parser_options()).collect();

    let html = render_events(&events, mode.rules());

    tracing::debug!(
        ?mode,
        source_bytes = source.len(),
        html_bytes = html.len(),
        "Rendered markdown"
    );

    html
}

/// Render the preview and clipboard HTML in two independent passes.
pub fn render_both(source: &str) -> DualRender {
    DualRender {
        preview: to_html(source, RenderMode::Preview),
        clipboard: to_html(source, RenderMode::Clipboard),
    }
}

/// Index of the `End` event closing the `Start` at `start`.
fn matching_end(events: &[Event<'_>], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, event) in events[start..].iter().enumerate() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Raw text of a code block, without any markup.
fn code_text(children: &[Event<'_>]) -> String {
    children
        .iter()
        .filter_map(|event| match event {
            Event::Text(text) => Some(text.as_ref()),
            _ => None,
        })
        .collect()
}

/// Apply the rule for `tag` if the rule set overrides it.
///
/// Returns `None` for constructs left to pulldown-cmark's own HTML writer.
fn apply_rule(rules: &RuleSet, tag: &Tag<'_>, children: &[Event<'_>]) -> Option<Event<'static>> {
    let block = |html: String| Some(Event::Html(CowStr::from(html)));
    let inline = |html: String| Some(Event::InlineHtml(CowStr::from(html)));

    match tag {
        Tag::Heading { level, .. } => {
            block((rules.heading)(*level, &render_events(children, rules)))
        }
        Tag::Paragraph => block((rules.paragraph)(&render_events(children, rules))),
        Tag::BlockQuote => block((rules.blockquote)(&render_events(children, rules))),
        Tag::List(start) => block((rules.list)(*start, &render_events(children, rules))),
        Tag::CodeBlock(kind) => {
            let lang = match kind {
                CodeBlockKind::Fenced(info) => Some(info.as_ref()),
                CodeBlockKind::Indented => None,
            };
            block((rules.code_block)(lang, &code_text(children)))
        }
        Tag::Emphasis => inline((rules.emphasis)(&render_events(children, rules))),
        Tag::Strong => inline((rules.strong)(&render_events(children, rules))),
        _ => None,
    }
}

/// Walk the event stream, replacing overridden constructs by their rendered
/// fragments, and let pulldown-cmark write everything else.
fn render_events(events: &[Event<'_>], rules: &RuleSet) -> String {
    let raw_html = |raw: &str| CowStr::from((rules.raw_html)(raw).into_owned());
    let mut processed = Vec::with_capacity(events.len());

    let mut i = 0;
    while i < events.len() {
        let event = &events[i];

        if let Event::Start(tag) = event {
            // Alt text is written as plain text, rule markup would end up escaped in it.
            if matches!(tag, Tag::Image { .. }) {
                let end = matching_end(events, i).unwrap_or(events.len() - 1);
                processed.extend(events[i..=end].iter().cloned());
                i = end + 1;
                continue;
            }

            let fragment = matching_end(events, i).and_then(|end| {
                apply_rule(rules, tag, &events[i + 1..end]).map(|fragment| (fragment, end))
            });
            if let Some((fragment, end)) = fragment {
                processed.push(fragment);
                i = end + 1;
                continue;
            }
        }

        match event {
            Event::Rule => processed.push(Event::Html(CowStr::from((rules.horizontal_rule)()))),
            Event::Html(raw) => processed.push(Event::Html(raw_html(raw))),
            Event::InlineHtml(raw) => processed.push(Event::InlineHtml(raw_html(raw))),
            event => processed.push(event.clone()),
        }
        i += 1;
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, processed.into_iter());
    html_output
}
