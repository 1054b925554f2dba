//! Heading-outline TOC front-end (`toc.md`).
//!
//! Each heading is one node; its depth (`#`, `##`, ...) encodes nesting:
//!
//! ```text
//! # [Guide](guide/)
//! ## [Install](guide/install.md)
//! ## [Types](@System.Types)
//! # Reference
//! ## <xref:System.String>
//! ```
//!
//! HTML comments (single- or multi-line) are skipped with their content.
//! A bare link line without `#` and any other unrecognized line are errors.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::node::TocNode;

static HEADING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#+)(.*)$").expect("invalid heading regex"));

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<name>.*)\]\((?P<href>.*)\)$").expect("invalid link regex")
});

static XREF_TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<xref:(?P<uid>[^>\s]+)>$").expect("invalid xref regex"));

/// Parse a heading-outline TOC into a tree rooted at an unnamed node.
pub(crate) fn parse(content: &str, file: &str) -> Result<TocNode, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    // (heading level, node); the root sits at level 0
    let mut stack: Vec<(usize, TocNode)> = vec![(0, TocNode::default())];
    let mut comment_start: Option<usize> = None;

    for (index, raw_line) in content.lines().enumerate() {
        let line_no = index + 1;
        let text = strip_comments(raw_line, line_no, &mut comment_start);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let column = raw_line.find(trimmed).map_or(1, |offset| offset + 1);

        let Some(caps) = HEADING_PATTERN.captures(trimmed) else {
            let message = if trimmed.starts_with('[') {
                "link without heading marker"
            } else {
                "unknown syntax"
            };
            return Err(ParseError::new(file, line_no, column, message));
        };

        let level = caps[1].len();
        let body = heading_body(&caps[2])
            .ok_or_else(|| ParseError::new(file, line_no, column, "expected space after '#'"))?;
        if body.is_empty() {
            return Err(ParseError::new(file, line_no, column, "empty heading"));
        }

        let current = stack.last().map_or(0, |(level, _)| *level);
        if level > current + 1 {
            return Err(ParseError::new(
                file,
                line_no,
                column,
                format!("heading level {level} skips level {}", current + 1),
            ));
        }

        let node = parse_heading(body)
            .ok_or_else(|| ParseError::new(file, line_no, column, "unknown syntax"))?;
        close_until(&mut stack, level);
        stack.push((level, node));
    }

    if let Some(line) = comment_start {
        return Err(ParseError::new(file, line, 1, "unterminated HTML comment"));
    }

    close_until(&mut stack, 1);
    Ok(stack.pop().map(|(_, root)| root).unwrap_or_default())
}

/// Pop every open node at `level` or deeper into its parent.
fn close_until(stack: &mut Vec<(usize, TocNode)>, level: usize) {
    while stack.len() > 1 && stack.last().is_some_and(|(open, _)| *open >= level) {
        if let Some((_, node)) = stack.pop()
            && let Some((_, parent)) = stack.last_mut()
        {
            parent.items.push(node);
        }
    }
}

/// Remove `<!-- ... -->` spans, tracking comments that span lines.
fn strip_comments(line: &str, line_no: usize, comment_start: &mut Option<usize>) -> String {
    let mut kept = String::new();
    let mut rest = line;
    loop {
        if comment_start.is_some() {
            let Some(end) = rest.find("-->") else {
                break;
            };
            rest = &rest[end + 3..];
            *comment_start = None;
        } else if let Some(start) = rest.find("<!--") {
            kept.push_str(&rest[..start]);
            rest = &rest[start + 4..];
            *comment_start = Some(line_no);
        } else {
            kept.push_str(rest);
            break;
        }
    }
    kept
}

/// Text after the `#` run, with an optional closing sequence removed.
///
/// Returns `None` when the marker is not followed by whitespace.
fn heading_body(after_marker: &str) -> Option<&str> {
    if !after_marker.is_empty() && !after_marker.starts_with(char::is_whitespace) {
        return None;
    }
    let body = after_marker.trim();
    let without_closing = body.trim_end_matches('#');
    if without_closing.is_empty() || without_closing.ends_with(char::is_whitespace) {
        Some(without_closing.trim_end())
    } else {
        Some(body)
    }
}

/// Node for a heading body, or `None` for a link or xref tag followed by
/// stray text.
fn parse_heading(body: &str) -> Option<TocNode> {
    if let Some(caps) = XREF_TAG_PATTERN.captures(body) {
        return Some(TocNode::default().with_uid(&caps["uid"]));
    }

    let Some(caps) = LINK_PATTERN.captures(body) else {
        if body.starts_with('[') || body.starts_with("<xref:") {
            return None;
        }
        return Some(TocNode::named(body));
    };

    let name = caps["name"].trim();
    let mut node = if name.is_empty() {
        TocNode::default()
    } else {
        TocNode::named(name)
    };

    let target = link_target(&caps["href"]);
    if let Some(uid) = target.strip_prefix('@').or_else(|| target.strip_prefix("xref:")) {
        node.uid = Some(uid.to_owned());
    } else if !target.is_empty() {
        node.href = Some(target.to_owned());
    }
    Some(node)
}

/// Link destination without angle brackets or a trailing `"title"`.
fn link_target(raw: &str) -> &str {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
        return inner.trim();
    }
    raw.split_once(char::is_whitespace)
        .map_or(raw, |(target, _)| target)
}
