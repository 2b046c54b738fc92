//! Per-construct rendering rules.
//!
//! Each rule turns one parsed node into the HTML fragment Medium's paste
//! sanitizer keeps intact. Rules are plain functions collected into two
//! immutable tables, one per [`RenderMode`], so a render call never builds or
//! mutates rule state.

use super::RenderMode;
use once_cell::sync::Lazy;
use pulldown_cmark::HeadingLevel;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// Language recorded on code blocks that carry no info string.
pub const DEFAULT_CODE_LANGUAGE: &str = "plaintext";

/// Inline declaration Medium keeps on `strong` even after dropping the
/// heading or emphasis semantics around it.
pub const BOLD_STYLE: &str = "font-weight: bold;";

/// Styling for code blocks in the on-screen preview.
pub const PREVIEW_CODE_STYLE: &str = "background-color: #f0f0f0; padding: 1em; \
    border-radius: 5px; white-space: pre-wrap; word-wrap: break-word;";

/// Placeholder for blank code lines, prevents the sanitizer from splitting
/// one block into two on paste.
const BLANK_CODE_LINE: &str = "&nbsp;";

/// Table of rendering rules for a single mode.
///
/// Block rules receive the already rendered HTML of their children, code
/// blocks receive the raw code text.
pub struct RuleSet {
    pub mode: RenderMode,
    pub heading: fn(HeadingLevel, &str) -> String,
    pub paragraph: fn(&str) -> String,
    pub blockquote: fn(&str) -> String,
    pub list: fn(Option<u64>, &str) -> String,
    pub code_block: fn(Option<&str>, &str) -> String,
    pub emphasis: fn(&str) -> String,
    pub strong: fn(&str) -> String,
    pub horizontal_rule: fn() -> String,
    /// Raw HTML written directly in the source.
    pub raw_html: fn(&str) -> Cow<'_, str>,
}

pub static PREVIEW_RULES: RuleSet = RuleSet {
    mode: RenderMode::Preview,
    heading,
    paragraph,
    blockquote,
    list,
    code_block: preview_code_block,
    emphasis,
    strong,
    horizontal_rule,
    raw_html: keep_raw_html,
};

pub static CLIPBOARD_RULES: RuleSet = RuleSet {
    mode: RenderMode::Clipboard,
    heading,
    paragraph,
    blockquote,
    list,
    code_block: clipboard_code_block,
    emphasis,
    strong,
    horizontal_rule,
    raw_html: strip_class_and_id,
};

/// Escape the five HTML-significant characters.
///
/// # Example
///
/// ```
/// use medium_preview_core::render::rules::escape_html;
///
/// assert_eq!(escape_html(r#"a<b & "c"'"#), "a&lt;b &amp; &quot;c&quot;&#39;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn keep_raw_html(html: &str) -> Cow<'_, str> {
    Cow::Borrowed(html)
}

/// Drop `class` and `id` attributes from every tag in `html`.
///
/// Text between tags is left untouched.
///
/// # Example
///
/// ```
/// use medium_preview_core::render::rules::strip_class_and_id;
///
/// assert_eq!(
///     strip_class_and_id(r#"<span class="x" id='y' title="t">class="z"</span>"#),
///     r#"<span title="t">class="z"</span>"#
/// );
/// ```
pub fn strip_class_and_id(html: &str) -> Cow<'_, str> {
    static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[A-Za-z][^>]*>").unwrap());
    static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?i)\s+(?:class|id)\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+)"#).unwrap()
    });

    TAG.replace_all(html, |caps: &Captures| {
        ATTRIBUTE.replace_all(&caps[0], "").into_owned()
    })
}

/// Medium only knows two heading sizes: h1/h2 collapse into the large one,
/// everything below into the small one.
fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 | HeadingLevel::H2 => "h3",
        _ => "h4",
    }
}

fn heading(level: HeadingLevel, inner: &str) -> String {
    let tag = heading_tag(level);
    format!("<{tag}><strong style=\"{BOLD_STYLE}\">{inner}</strong></{tag}>\n")
}

fn paragraph(inner: &str) -> String {
    format!("<p>{inner}</p>\n")
}

/// Remove the leading `<p>` and trailing `</p>` only, nested paragraphs stay.
///
/// Both ends must be present, otherwise the quote keeps its markup as is.
fn strip_outer_paragraph(html: &str) -> &str {
    html.strip_prefix("<p>")
        .and_then(|html| html.strip_suffix("</p>"))
        .unwrap_or(html)
}

fn blockquote(inner: &str) -> String {
    let body = strip_outer_paragraph(inner.trim());
    format!("<blockquote>{body}</blockquote>\n")
}

fn list(start: Option<u64>, inner: &str) -> String {
    match start {
        Some(1) => format!("<ol>\n{inner}</ol>\n"),
        Some(start) => format!("<ol start=\"{start}\">\n{inner}</ol>\n"),
        None => format!("<ul>\n{inner}</ul>\n"),
    }
}

fn emphasis(inner: &str) -> String {
    format!("<em>{inner}</em>")
}

fn strong(inner: &str) -> String {
    format!("<strong style=\"{BOLD_STYLE}\">{inner}</strong>")
}

fn horizontal_rule() -> String {
    "<hr>\n".to_string()
}

/// Language attribute value, falls back to [`DEFAULT_CODE_LANGUAGE`].
fn code_language(lang: Option<&str>) -> String {
    let lang = lang
        .and_then(|info| info.split_whitespace().next())
        .unwrap_or(DEFAULT_CODE_LANGUAGE);
    escape_html(lang)
}

/// Escaped code body shared by both modes.
///
/// Every line is de-indented to its first non-whitespace character and blank
/// lines become [`BLANK_CODE_LINE`].
pub fn code_body(code: &str) -> String {
    let code = code.strip_suffix('\n').unwrap_or(code);
    code.split('\n')
        .map(|line| {
            let line = line.trim_end_matches('\r').trim_start();
            if line.trim().is_empty() {
                BLANK_CODE_LINE.to_string()
            } else {
                escape_html(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn preview_code_block(lang: Option<&str>, code: &str) -> String {
    format!(
        "<pre class=\"language-{}\" style=\"{PREVIEW_CODE_STYLE}\">{}</pre>\n",
        code_language(lang),
        code_body(code)
    )
}

fn clipboard_code_block(lang: Option<&str>, code: &str) -> String {
    format!(
        "<pre data-code-block-lang=\"{}\">{}</pre>\n",
        code_language(lang),
        code_body(code)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_levels_collapse() {
        assert_eq!(
            heading(HeadingLevel::H1, "Title"),
            "<h3><strong style=\"font-weight: bold;\">Title</strong></h3>\n"
        );
        assert!(heading(HeadingLevel::H2, "x").starts_with("<h3>"));
        assert!(heading(HeadingLevel::H3, "x").starts_with("<h4>"));
        assert!(heading(HeadingLevel::H6, "x").ends_with("</h4>\n"));
    }

    #[test]
    fn test_blockquote_strips_outer_paragraph_only() {
        assert_eq!(blockquote("<p>hello</p>\n"), "<blockquote>hello</blockquote>\n");
        assert_eq!(
            blockquote("<p>a</p>\n<p>b</p>\n"),
            "<blockquote>a</p>\n<p>b</blockquote>\n"
        );
        assert_eq!(
            blockquote("<ul>\n<li>x</li>\n</ul>\n"),
            "<blockquote><ul>\n<li>x</li>\n</ul></blockquote>\n"
        );
    }

    #[test]
    fn test_blockquote_keeps_unmatched_paragraph() {
        assert_eq!(
            blockquote("<h3>Title</h3>\n<p>body</p>\n"),
            "<blockquote><h3>Title</h3>\n<p>body</p></blockquote>\n"
        );
        assert_eq!(
            blockquote("<p>lead</p>\n<hr>\n"),
            "<blockquote><p>lead</p>\n<hr></blockquote>\n"
        );
    }

    #[test]
    fn test_strip_class_and_id() {
        assert_eq!(
            strip_class_and_id("<div class=\"note\" ID=main data-id=\"7\">n</div>"),
            "<div data-id=\"7\">n</div>"
        );
        assert_eq!(strip_class_and_id("<br>"), "<br>");
        assert!(matches!(strip_class_and_id("plain text"), Cow::Borrowed(_)));
        assert!(matches!((PREVIEW_RULES.raw_html)("<b id=\"x\">"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_list_start_attribute() {
        assert_eq!(list(Some(5), "<li>a</li>\n"), "<ol start=\"5\">\n<li>a</li>\n</ol>\n");
        assert_eq!(list(Some(1), ""), "<ol>\n</ol>\n");
        assert_eq!(list(None, ""), "<ul>\n</ul>\n");
    }

    #[test]
    fn test_code_body_dedents_each_line() {
        assert_eq!(code_body("fn main() {\n    body();\n}\n"), "fn main() {\nbody();\n}");
    }

    #[test]
    fn test_code_body_blank_lines() {
        assert_eq!(code_body("a\n\n   \nb\n"), "a\n&nbsp;\n&nbsp;\nb");
    }

    #[test]
    fn test_code_language() {
        assert_eq!(code_language(None), "plaintext");
        assert_eq!(code_language(Some("")), "plaintext");
        assert_eq!(code_language(Some("rust ignore")), "rust");
        assert_eq!(code_language(Some("c\"x")), "c&quot;x");
    }

    #[test]
    fn test_code_block_modes() {
        let preview = preview_code_block(Some("js"), "let a = 1;\n");
        assert!(preview.starts_with("<pre class=\"language-js\" style=\"background-color"));

        let clipboard = clipboard_code_block(Some("js"), "let a = 1;\n");
        assert_eq!(clipboard, "<pre data-code-block-lang=\"js\">let a = 1;</pre>\n");
    }

    #[test]
    fn test_horizontal_rule_is_bare() {
        assert_eq!(horizontal_rule(), "<hr>\n");
    }

    #[test]
    fn test_rule_tables_are_mode_scoped() {
        assert_eq!(PREVIEW_RULES.mode, RenderMode::Preview);
        assert_eq!(CLIPBOARD_RULES.mode, RenderMode::Clipboard);
    }
}
