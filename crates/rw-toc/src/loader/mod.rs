//! TOC document loading.
//!
//! Two front-ends normalize to the common [`TocNode`] shape:
//! - [`markdown`]: heading-outline syntax (`toc.md`)
//! - [`structured`]: key/value syntax in YAML or JSON (`toc.yml`, `toc.json`)
//!
//! The front-end is selected by file extension, falling back to sniffing the
//! content for files with unknown extensions.

mod markdown;
mod structured;

use crate::error::ParseError;
use crate::node::TocNode;
use crate::path;

/// Source syntax of a TOC document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TocFormat {
    /// Heading-outline markdown.
    Markdown,
    /// Structured YAML.
    Yaml,
    /// Structured JSON.
    Json,
}

impl TocFormat {
    /// Format implied by a file extension, if recognized.
    #[must_use]
    pub fn from_path(file: &str) -> Option<Self> {
        let (file, _) = path::split_suffix(file);
        let (_, ext) = path::file_name(file).rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "yml" | "yaml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Format for a document, by extension or else by content shape.
    #[must_use]
    pub fn detect(file: &str, content: &str) -> Self {
        Self::from_path(file).unwrap_or_else(|| Self::sniff(content))
    }

    /// Guess the format from content.
    ///
    /// Markdown when the first non-blank line is a heading and some line
    /// contains a link or xref tag; JSON when it opens with `{`; YAML otherwise.
    fn sniff(content: &str) -> Self {
        let first = content
            .trim_start_matches('\u{feff}')
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty());
        match first {
            Some(line) if line.starts_with('{') => Self::Json,
            Some(line)
                if line.starts_with('#')
                    && content.lines().any(|l| l.contains("](") || l.contains("<xref:")) =>
            {
                Self::Markdown
            }
            _ => Self::Yaml,
        }
    }
}

/// Parse one TOC document into a tree.
///
/// The returned root is an unnamed container whose `items` are the
/// document's top-level entries. Structured documents may set root
/// `metadata`; markdown documents never do.
///
/// # Arguments
///
/// * `content` - Document text
/// * `file` - Root-relative identity of the document, used for format
///   detection and error reporting
///
/// # Errors
///
/// Returns [`ParseError`] with a 1-based line and column for malformed input.
pub fn load_toc(content: &str, file: &str) -> Result<TocNode, ParseError> {
    match TocFormat::detect(file, content) {
        TocFormat::Markdown => markdown::parse(content, file),
        TocFormat::Yaml => structured::parse_yaml(content, file),
        TocFormat::Json => structured::parse_json(content, file),
    }
}

/// Serialize a tree to the structured YAML format.
///
/// # Errors
///
/// Returns an error if a metadata value cannot be represented in YAML.
pub fn to_yaml(tree: &TocNode) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(tree)
}

/// Serialize a tree to the structured JSON format (pretty-printed).
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(tree: &TocNode) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tree)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_tree() -> TocNode {
        let mut root = TocNode::default()
            .with_child(
                TocNode::named("Guide")
                    .with_href("guide/index.md")
                    .with_topic_href("guide/index.md")
                    .with_child(TocNode::named("Install").with_uid("guide.install")),
            )
            .with_child(
                TocNode::named("API")
                    .with_toc_href("api/")
                    .with_homepage("api/index.md"),
            );
        root.metadata
            .insert("pdf".to_owned(), serde_json::json!({ "enabled": true }));
        root.items[0].included_from = Some("guide/toc.yml".to_owned());
        root.items[1]
            .metadata
            .insert("order".to_owned(), serde_json::json!(2));
        root
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(TocFormat::from_path("toc.md"), Some(TocFormat::Markdown));
        assert_eq!(TocFormat::from_path("a/TOC.YML"), Some(TocFormat::Yaml));
        assert_eq!(TocFormat::from_path("toc.json"), Some(TocFormat::Json));
        assert_eq!(TocFormat::from_path("toc"), None);
    }

    #[test]
    fn test_detect_by_content() {
        assert_eq!(
            TocFormat::detect("toc", "# [A](a.md)\n"),
            TocFormat::Markdown
        );
        assert_eq!(
            TocFormat::detect("toc", "# yaml comment\n- name: A\n"),
            TocFormat::Yaml
        );
        assert_eq!(TocFormat::detect("toc", "{\"items\": []}"), TocFormat::Json);
    }

    #[test]
    fn test_load_toc_dispatches_by_extension() {
        let md = load_toc("# [A](a.md)\n", "toc.md").unwrap();
        let yml = load_toc("- name: A\n  href: a.md\n", "toc.yml").unwrap();
        assert_eq!(md, yml);
    }

    #[test]
    fn test_yaml_round_trip() {
        let tree = sample_tree();
        let yaml = to_yaml(&tree).unwrap();
        let parsed = load_toc(&yaml, "toc.yml").unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn test_json_round_trip() {
        let tree = sample_tree();
        let json = to_json(&tree).unwrap();
        let parsed = load_toc(&json, "toc.json").unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let json = to_json(&sample_tree()).unwrap();
        assert!(json.contains("\"topicHref\""));
        assert!(json.contains("\"tocHref\""));
        assert!(json.contains("\"includedFrom\""));
    }
}
