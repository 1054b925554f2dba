//! TOC tree node model.
//!
//! A [`TocNode`] owns its children directly (`items`), so a tree is a plain
//! owned value with no back-references. Traversal is always top-down.
//!
//! All relative link fields (`href`, `topic_href`, `toc_href`, `homepage`) are
//! relative to the file that currently owns the node. Moving a subtree into a
//! different file goes through [`TocNode::rebase_paths`], which rewrites every
//! relative link of the subtree in one pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::path;

/// Node of a table-of-contents tree.
///
/// Serializes to the structured (YAML/JSON) TOC format with camelCase keys.
/// Absent and empty fields are omitted, so a serialize/parse round trip yields
/// an equal tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocNode {
    /// Display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Link target. Absent for pure containers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Effective link when `href` names a folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_href: Option<String>,
    /// Pointer to a child TOC file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toc_href: Option<String>,
    /// Explicit landing page for a node that references another TOC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Symbolic identity, alternative to `href`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Root-relative identity of the TOC file whose items were spliced into
    /// this node. Set only on the inclusion boundary, never on descendants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_from: Option<String>,
    /// Open key-value bag.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Ordered children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<TocNode>,
}

impl TocNode {
    /// Create a node with a display name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the link target.
    #[must_use]
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Set the topic link.
    #[must_use]
    pub fn with_topic_href(mut self, href: impl Into<String>) -> Self {
        self.topic_href = Some(href.into());
        self
    }

    /// Set the child TOC pointer.
    #[must_use]
    pub fn with_toc_href(mut self, href: impl Into<String>) -> Self {
        self.toc_href = Some(href.into());
        self
    }

    /// Set the landing page.
    #[must_use]
    pub fn with_homepage(mut self, href: impl Into<String>) -> Self {
        self.homepage = Some(href.into());
        self
    }

    /// Set the uid.
    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Append a child.
    #[must_use]
    pub fn with_child(mut self, child: TocNode) -> Self {
        self.items.push(child);
        self
    }

    /// Replace the children.
    #[must_use]
    pub fn with_items(mut self, items: Vec<TocNode>) -> Self {
        self.items = items;
        self
    }

    /// Stable key used to address this node: `uid`, or `href` without a uid.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.uid.as_deref().or(self.href.as_deref())
    }

    /// Total number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.items.iter().map(TocNode::count).sum::<usize>()
    }

    /// Find the first node in pre-order whose identity equals `key`.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&TocNode> {
        if self.identity() == Some(key) {
            return Some(self);
        }
        self.items.iter().find_map(|item| item.find(key))
    }

    /// Re-anchor every relative link in this subtree onto `dir`.
    ///
    /// Used when a subtree moves from a file in `dir` (relative to the new
    /// owner) into the owning file. `included_from` is a root-relative
    /// identity and is left untouched.
    pub fn rebase_paths(&mut self, dir: &str) {
        if dir.is_empty() {
            return;
        }
        for field in [
            &mut self.href,
            &mut self.topic_href,
            &mut self.toc_href,
            &mut self.homepage,
        ] {
            if let Some(link) = field {
                *link = path::rebase(link, dir);
            }
        }
        for item in &mut self.items {
            item.rebase_paths(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_identity_prefers_uid() {
        let node = TocNode::named("A").with_href("a.md").with_uid("A.Uid");
        assert_eq!(node.identity(), Some("A.Uid"));

        let node = TocNode::named("A").with_href("a.md");
        assert_eq!(node.identity(), Some("a.md"));

        assert_eq!(TocNode::named("A").identity(), None);
    }

    #[test]
    fn test_count_and_find() {
        let tree = TocNode::default()
            .with_child(TocNode::named("A").with_uid("a").with_child(TocNode::named("B").with_uid("b")))
            .with_child(TocNode::named("C").with_href("c.md"));

        assert_eq!(tree.count(), 4);
        assert_eq!(tree.find("b").and_then(|n| n.name.as_deref()), Some("B"));
        assert_eq!(tree.find("c.md").and_then(|n| n.name.as_deref()), Some("C"));
        assert!(tree.find("missing").is_none());
    }

    #[test]
    fn test_rebase_paths_rewrites_whole_subtree() {
        let mut node = TocNode::named("Sub")
            .with_href("intro.md#top")
            .with_homepage("index.md")
            .with_child(
                TocNode::named("Deep")
                    .with_toc_href("../other/")
                    .with_topic_href("deep.md"),
            )
            .with_child(TocNode::named("External").with_href("https://example.com"));
        node.included_from = Some("sub/toc.yml".to_owned());

        node.rebase_paths("sub");

        assert_eq!(node.href.as_deref(), Some("sub/intro.md#top"));
        assert_eq!(node.homepage.as_deref(), Some("sub/index.md"));
        assert_eq!(node.items[0].toc_href.as_deref(), Some("other/"));
        assert_eq!(node.items[0].topic_href.as_deref(), Some("sub/deep.md"));
        assert_eq!(node.items[1].href.as_deref(), Some("https://example.com"));
        assert_eq!(node.included_from.as_deref(), Some("sub/toc.yml"));
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let node = TocNode::named("A").with_href("a.md");
        let yaml = serde_yaml::to_string(&node).unwrap();
        assert_eq!(yaml, "name: A\nhref: a.md\n");
    }
}
