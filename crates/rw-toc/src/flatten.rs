//! Flattened pre-order view of a TOC tree for templates.

use serde::Serialize;

use crate::node::TocNode;

/// One TOC entry with its position in the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatTocItem {
    /// Nesting depth, 0 for top-level entries.
    pub depth: usize,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Link target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Symbolic identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Index of the parent entry in the flattened list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

/// Flatten `tree` in pre-order, excluding the root.
#[must_use]
pub fn flatten(tree: &TocNode) -> Vec<FlatTocItem> {
    fn walk(node: &TocNode, depth: usize, parent: Option<usize>, out: &mut Vec<FlatTocItem>) {
        for item in &node.items {
            let index = out.len();
            out.push(FlatTocItem {
                depth,
                name: item.name.clone(),
                href: item.href.clone(),
                uid: item.uid.clone(),
                parent,
            });
            walk(item, depth + 1, Some(index), out);
        }
    }

    let mut items = Vec::with_capacity(tree.count());
    walk(tree, 0, None, &mut items);
    items
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_flatten_preorder_with_parents() {
        let tree = TocNode::default()
            .with_child(
                TocNode::named("Guide")
                    .with_child(TocNode::named("Install").with_href("install.md"))
                    .with_child(TocNode::default().with_uid("Api.Type")),
            )
            .with_child(TocNode::named("FAQ").with_href("faq.md"));

        let flat = flatten(&tree);

        let shape: Vec<_> = flat.iter().map(|i| (i.depth, i.parent)).collect();
        assert_eq!(shape, vec![(0, None), (1, Some(0)), (1, Some(0)), (0, None)]);
        assert_eq!(flat[1].href.as_deref(), Some("install.md"));
        assert_eq!(flat[2].uid.as_deref(), Some("Api.Type"));
        assert_eq!(flat[3].name.as_deref(), Some("FAQ"));
    }

    #[test]
    fn test_flatten_empty_tree() {
        assert!(flatten(&TocNode::default()).is_empty());
    }
}
