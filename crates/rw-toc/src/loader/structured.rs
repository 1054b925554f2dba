//! Structured key/value TOC front-end (`toc.yml`, `toc.json`).
//!
//! A document is either a sequence of items:
//!
//! ```yaml
//! - name: Guide
//!   href: guide/
//! - name: API
//!   tocHref: api/toc.yml
//!   topicHref: api/index.md
//! ```
//!
//! or a mapping carrying document-level `metadata` next to `items`:
//!
//! ```yaml
//! metadata:
//!   pdf: true
//! items:
//!   - name: Guide
//!     href: guide/
//! ```
//!
//! Only the root of the loaded file receives the document-level metadata.

use crate::error::ParseError;
use crate::node::TocNode;

/// Parse a YAML TOC document.
pub(crate) fn parse_yaml(content: &str, file: &str) -> Result<TocNode, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    match first_significant_line(content) {
        None => Ok(TocNode::default()),
        Some(line) if line.starts_with('-') || line.starts_with('[') => {
            serde_yaml::from_str::<Vec<TocNode>>(content)
                .map(|items| TocNode::default().with_items(items))
                .map_err(|e| yaml_error(&e, file))
        }
        Some(_) => serde_yaml::from_str::<TocNode>(content).map_err(|e| yaml_error(&e, file)),
    }
}

/// Parse a JSON TOC document.
pub(crate) fn parse_json(content: &str, file: &str) -> Result<TocNode, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    match content.trim_start().chars().next() {
        None => Ok(TocNode::default()),
        Some('[') => serde_json::from_str::<Vec<TocNode>>(content)
            .map(|items| TocNode::default().with_items(items))
            .map_err(|e| json_error(&e, file)),
        Some(_) => serde_json::from_str::<TocNode>(content).map_err(|e| json_error(&e, file)),
    }
}

/// First line that is neither blank, a comment, nor a document marker.
fn first_significant_line(content: &str) -> Option<&str> {
    content
        .lines()
        .map(str::trim_start)
        .find(|line| !line.is_empty() && !line.starts_with('#') && *line != "---")
}

fn yaml_error(err: &serde_yaml::Error, file: &str) -> ParseError {
    let (line, column) = err
        .location()
        .map_or((0, 0), |loc| (loc.line(), loc.column()));
    ParseError::new(file, line, column, err.to_string())
}

fn json_error(err: &serde_json::Error, file: &str) -> ParseError {
    ParseError::new(file, err.line(), err.column(), err.to_string())
}
