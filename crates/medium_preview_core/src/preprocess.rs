//! Line-oriented normalization applied before parsing.
//!
//! pulldown-cmark treats a fence delimiter indented by four or more columns
//! as indented code, and an indented closing fence can fail to close the
//! block it belongs to. Pulling every delimiter line back to column zero keeps
//! fenced blocks fenced regardless of how the author indented them.

const FENCE_MARKERS: [&str; 2] = ["```", "~~~"];

/// Returns `true` if the line opens or closes a fenced code block.
fn is_fence_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    FENCE_MARKERS
        .iter()
        .any(|marker| trimmed.starts_with(marker))
}

/// Strip the leading whitespace of fence delimiter lines.
///
/// Every other line passes through untouched, and line terminators
/// (`\n`, `\r\n`, or none on the final line) are kept as they were.
///
/// # Example
///
/// ```
/// use medium_preview_core::preprocess::normalize_fences;
///
/// let text = "  ```rust\n  let x = 1;\n  ```\n";
/// assert_eq!(normalize_fences(text), "```rust\n  let x = 1;\n```\n");
/// ```
pub fn normalize_fences(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());

    for line in text.split_inclusive('\n') {
        if is_fence_line(line) {
            normalized.push_str(line.trim_start());
        } else {
            normalized.push_str(line);
        }
    }

    normalized
}
