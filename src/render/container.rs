//! Container pre-pass.
//!
//! Rewrites `:::` directives into HTML blocks before markdown parsing and
//! checks that containers and raw `<details>` tags are balanced:
//!
//! ```text
//! :::details Why does `this` change?        <details class="quire-details">
//! Because of the call site.          ->     <summary>Why does `this` change?</summary>
//! :::                                       ...
//!                                           </details>
//! ```
//!
//! Code blocks (fenced or indented, at any list depth) and inline code spans
//! are left alone. Their extent comes from pulldown-cmark itself.

use super::markdown::parser_options;
use crate::error::SiteError;
use crate::utils::html::escape_html;
use pulldown_cmark::{Event, Parser, Tag};
use std::{ops::Range, path::Path};

/// Admonition kinds with built-in styling. Other names still render, with
/// the generic style.
pub const ADMONITIONS: &[&str] = &["note", "tip", "info", "warning", "danger", "caution"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Open {
    /// `:::name`, opened on `line`
    Directive { name: String, line: usize },
    /// Raw `<details>` tag, opened on `line`
    Details { line: usize },
}

impl Open {
    fn describe(&self) -> String {
        match self {
            Self::Directive { name, line } => format!("`:::{name}` opened on line {line}"),
            Self::Details { line } => format!("`<details>` opened on line {line}"),
        }
    }
}

/// Expand containers in `body`. `first_line` is the file line of the body's
/// first line, used in diagnostics.
pub fn expand(body: &str, first_line: usize, path: &Path) -> Result<String, SiteError> {
    let code = CodeRanges::scan(body);
    let mut out = String::with_capacity(body.len() + 64);
    let mut stack: Vec<Open> = Vec::new();
    let mut line_start = 0;

    for (offset, raw) in body.split_inclusive('\n').enumerate() {
        let line_no = first_line + offset;
        let line = raw.trim_end_matches(['\n', '\r']);
        let start = line_start;
        line_start += raw.len();

        let indent = line.len() - line.trim_start().len();
        if code.contains(start + indent) && !line.trim().is_empty() {
            out.push_str(raw);
            continue;
        }

        match directive(line) {
            Some("") => {
                let Some(top) = stack.pop() else {
                    return Err(SiteError::content(
                        path,
                        Some(line_no),
                        "closing `:::` without an open container",
                    ));
                };
                match top {
                    Open::Directive { name, .. } => out.push_str(&close_html(&name)),
                    details @ Open::Details { .. } => {
                        return Err(SiteError::content(
                            path,
                            Some(line_no),
                            format!("`:::` cannot close {}", details.describe()),
                        ));
                    }
                }
            }
            Some(spec) => {
                let (name, title) = split_directive(spec);
                out.push_str(&open_html(&name, title));
                stack.push(Open::Directive {
                    name,
                    line: line_no,
                });
            }
            None => {
                track_details(&code.blank(line, start), line_no, &mut stack, path)?;
                out.push_str(raw);
            }
        }
    }

    // Terminate a final line without newline so a closing tag stays a block
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }

    match stack.pop() {
        Some(open) => Err(SiteError::content(
            path,
            Some(open_line(&open)),
            format!("unclosed container: {}", open.describe()),
        )),
        None => Ok(out),
    }
}

const fn open_line(open: &Open) -> usize {
    match open {
        Open::Directive { line, .. } | Open::Details { line } => *line,
    }
}

// ============================================================================
// Code
// ============================================================================

/// Byte ranges of code blocks and inline code spans, as pulldown-cmark sees
/// them. Nothing inside is container markup.
struct CodeRanges(Vec<Range<usize>>);

impl CodeRanges {
    fn scan(body: &str) -> Self {
        let ranges = Parser::new_ext(body, parser_options())
            .into_offset_iter()
            .filter_map(|(event, range)| match event {
                Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
                _ => None,
            })
            .collect();
        Self(ranges)
    }

    /// Ranges come in document order and never overlap.
    fn contains(&self, offset: usize) -> bool {
        let at = self.0.partition_point(|r| r.end <= offset);
        self.0.get(at).is_some_and(|r| r.start <= offset)
    }

    /// `line` (starting at byte `start` of the body) with code replaced by spaces.
    fn blank(&self, line: &str, start: usize) -> String {
        line.char_indices()
            .map(|(i, c)| if self.contains(start + i) { ' ' } else { c })
            .collect()
    }
}

/// Leading spaces, refusing indented-code depth.
fn block_indent(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches(' ');
    (line.len() - trimmed.len() < 4).then_some(trimmed)
}

// ============================================================================
// Directives
// ============================================================================

/// Text after a `:::` marker, `Some("")` for a bare closing marker.
fn directive(line: &str) -> Option<&str> {
    let trimmed = block_indent(line)?;
    let colons = trimmed.chars().take_while(|c| *c == ':').count();
    (colons >= 3).then(|| trimmed[colons..].trim())
}

/// `details Summary text` -> (`details`, `Summary text`)
fn split_directive(spec: &str) -> (String, &str) {
    let (name, title) = spec.split_once(char::is_whitespace).unwrap_or((spec, ""));
    let name: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_ascii_lowercase();
    (name, title.trim())
}

fn open_html(name: &str, title: &str) -> String {
    if name == "details" {
        let summary = if title.is_empty() { "Details" } else { title };
        format!(
            "\n<details class=\"quire-details\">\n<summary>{}</summary>\n\n",
            escape_html(summary)
        )
    } else {
        let title = if title.is_empty() {
            capitalize(name)
        } else {
            title.to_owned()
        };
        format!(
            "\n<div class=\"quire-admonition quire-admonition-{name}\">\n<p class=\"quire-admonition-title\">{}</p>\n\n",
            escape_html(&title)
        )
    }
}

fn close_html(name: &str) -> String {
    if name == "details" {
        "\n</details>\n\n".into()
    } else {
        "\n</div>\n\n".into()
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Note".into(),
    }
}

// ============================================================================
// Raw <details>
// ============================================================================

/// Push and pop raw `<details>` tags found on `line`.
fn track_details(line: &str, line_no: usize, stack: &mut Vec<Open>, path: &Path) -> Result<(), SiteError> {
    let visible = line.to_ascii_lowercase();
    let mut rest = visible.as_str();

    while let Some(at) = rest.find("<details").into_iter().chain(rest.find("</details")).min() {
        if rest[at..].starts_with("</details") {
            match stack.pop() {
                Some(Open::Details { .. }) => {}
                Some(directive @ Open::Directive { .. }) => {
                    return Err(SiteError::content(
                        path,
                        Some(line_no),
                        format!("`</details>` cannot close {}", directive.describe()),
                    ));
                }
                None => {
                    return Err(SiteError::content(
                        path,
                        Some(line_no),
                        "`</details>` without a matching `<details>`",
                    ));
                }
            }
            rest = &rest[at + "</details".len()..];
        } else {
            let after = &rest[at + "<details".len()..];
            if after.starts_with(['>', ' ', '\t', '/']) || after.is_empty() {
                stack.push(Open::Details { line: line_no });
            }
            rest = after;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(body: &str) -> Result<String, SiteError> {
        expand(body, 10, Path::new("docs/a.md"))
    }

    fn error_line(result: Result<String, SiteError>) -> (usize, String) {
        match result {
            Err(SiteError::Content { line, message, .. }) => (line.unwrap(), message),
            other => panic!("expected content error, got {other:?}"),
        }
    }

    #[test]
    fn test_details_directive() {
        let out = run(":::details Why <this>?\nBecause.\n:::\n").unwrap();
        assert_eq!(
            out,
            "\n<details class=\"quire-details\">\n<summary>Why &lt;this&gt;?</summary>\n\nBecause.\n\n</details>\n\n"
        );
    }

    #[test]
    fn test_admonition_default_title() {
        let out = run(":::tip\nUse `let`.\n:::").unwrap();
        assert!(out.contains("quire-admonition-tip"));
        assert!(out.contains("<p class=\"quire-admonition-title\">Tip</p>"));
        assert!(out.contains("Use `let`."));
    }

    #[test]
    fn test_nested_containers() {
        let out = run(":::note Outer\n:::details Inner\nx\n:::\n:::\n").unwrap();
        let details = out.find("<details").unwrap();
        let close_details = out.find("</details>").unwrap();
        let close_div = out.find("</div>").unwrap();
        assert!(details < close_details && close_details < close_div);
    }

    #[test]
    fn test_fenced_code_is_untouched() {
        let body = "```md\n:::details not a container\n<details>\n```\ntext\n";
        assert_eq!(run(body).unwrap(), body);

        let body = "~~~~\n```\n:::\n~~~~\n";
        assert_eq!(run(body).unwrap(), body);
    }

    #[test]
    fn test_raw_details_balanced() {
        let body = "<details>\n<summary>S</summary>\n\nbody\n\n</details>\n";
        assert_eq!(run(body).unwrap(), body);
    }

    #[test]
    fn test_inline_code_span_ignored() {
        let body = "Write `<details>` to collapse, or ``</details>`` to end.\n";
        assert_eq!(run(body).unwrap(), body);
    }

    #[test]
    fn test_unclosed_directive_reports_open_line() {
        let (line, message) = error_line(run("intro\n:::details Open\nbody\n"));
        assert_eq!(line, 11);
        assert!(message.contains("unclosed"));
        assert!(message.contains(":::details"));
    }

    #[test]
    fn test_unopened_close_reports_line() {
        let (line, message) = error_line(run("a\nb\n:::\n"));
        assert_eq!(line, 12);
        assert!(message.contains("without an open container"));

        let (line, _) = error_line(run("</details>\n"));
        assert_eq!(line, 10);
    }

    #[test]
    fn test_mismatched_close() {
        let (line, message) = error_line(run(":::details A\n</details>\n:::\n"));
        assert_eq!(line, 11);
        assert!(message.contains("`:::details` opened on line 10"));

        let (line, message) = error_line(run("<details>\n:::\n"));
        assert_eq!(line, 11);
        assert!(message.contains("`<details>` opened on line 10"));
    }

    #[test]
    fn test_unclosed_raw_details() {
        let (line, _) = error_line(run("text\n<details open>\n"));
        assert_eq!(line, 11);
    }

    #[test]
    fn test_fence_inside_list_item() {
        let body = "1. Write the markup:\n\n    ```html\n    <details>\n    <summary>More</summary>\n    ```\n\n2. Done.\n";
        assert_eq!(run(body).unwrap(), body);
    }

    #[test]
    fn test_indented_code_block() {
        let body = "Example:\n\n    </details>\n    :::\n\nAfter.\n";
        assert_eq!(run(body).unwrap(), body);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let body = "```\n:::details\n";
        assert_eq!(run(body).unwrap(), body);
    }

    #[test]
    fn test_code_ranges_blank() {
        let line = "a `<details>` b <details>";
        let code = CodeRanges::scan(line);
        assert_eq!(code.blank(line, 0), "a             b <details>");
    }
}
