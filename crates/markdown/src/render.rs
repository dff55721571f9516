//! Markdown segmentation for chat bubbles.
//!
//! Handles the subset that chat models actually produce:
//! - fenced code blocks with an optional language tag
//! - `` `inline code` ``
//! - `**bold**`
//! - `## Heading` and `### Heading`
//!
//! Passes run in that order and each one only looks at the plain text
//! left over by the previous one, so nothing inside a code fence is ever
//! treated as bold or as a heading.

use regex::Regex;
use std::sync::LazyLock;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(\w*)\n?([\s\S]*?)```").unwrap());
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H2,
    H3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    CodeBlock { language: String, code: String },
    InlineCode(String),
    Bold(String),
    Heading { level: HeadingLevel, text: String },
    LineBreak,
}

/// Split `text` into display segments.
pub fn render(text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in FENCE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            render_prose(&text[last..whole.start()], &mut out);
        }
        let language = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|l| !l.is_empty())
            .unwrap_or("plaintext");
        let code = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        out.push(Segment::CodeBlock {
            language: language.to_string(),
            code: code.to_string(),
        });
        last = whole.end();
    }
    if last < text.len() {
        render_prose(&text[last..], &mut out);
    }

    if out.is_empty() {
        out.push(Segment::Text(text.to_string()));
    }
    out
}

/// Inline code, then bold, then headings.
fn render_prose(text: &str, out: &mut Vec<Segment>) {
    let mut leaves = Vec::new();
    split_spans(text, &INLINE_CODE, Segment::InlineCode, &mut leaves);

    let mut bolded = Vec::new();
    for leaf in leaves {
        match leaf {
            Segment::Text(t) => split_spans(&t, &BOLD, Segment::Bold, &mut bolded),
            other => bolded.push(other),
        }
    }

    for leaf in bolded {
        match leaf {
            Segment::Text(t) => split_headings(&t, out),
            other => out.push(other),
        }
    }
}

/// Cut every match of `re` out of `text` as `wrap(group 1)`, keeping the
/// text around it as plain leaves.
fn split_spans(text: &str, re: &Regex, wrap: fn(String) -> Segment, out: &mut Vec<Segment>) {
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            out.push(Segment::Text(text[last..whole.start()].to_string()));
        }
        let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        out.push(wrap(inner.to_string()));
        last = whole.end();
    }
    if last < text.len() {
        out.push(Segment::Text(text[last..].to_string()));
    }
}

fn split_headings(text: &str, out: &mut Vec<Segment>) {
    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        if let Some(rest) = line.strip_prefix("### ").filter(|r| !r.is_empty()) {
            out.push(Segment::Heading {
                level: HeadingLevel::H3,
                text: rest.to_string(),
            });
        } else if let Some(rest) = line.strip_prefix("## ").filter(|r| !r.is_empty()) {
            out.push(Segment::Heading {
                level: HeadingLevel::H2,
                text: rest.to_string(),
            });
        } else if !line.is_empty() {
            out.push(Segment::Text(line.to_string()));
        }

        if lines.peek().is_some() {
            out.push(Segment::LineBreak);
        }
    }
}

/// Flatten segments back into readable text (markup removed).
pub fn plain_text(segments: &[Segment]) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Text(t) | Segment::InlineCode(t) | Segment::Bold(t) => out.push_str(t),
            Segment::Heading { text, .. } => out.push_str(text),
            Segment::LineBreak => out.push('\n'),
            Segment::CodeBlock { code, .. } => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(code);
                out.push('\n');
            }
        }
    }
    out
}
