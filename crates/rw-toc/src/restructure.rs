//! Keyed structural edits on an expanded TOC tree.
//!
//! Operations address nodes by identity (uid, else href) and run strictly in
//! list order. Each operation re-scans the tree as left by the previous ones,
//! so a fragment inserted by one operation is a valid target for the next,
//! and a node removed by one operation is invisible to the rest.
//!
//! ```yaml
//! - actionType: AppendChild
//!   key: guide/index.md
//!   restructuredItems:
//!     - name: Changelog
//!       href: changelog.md
//! - actionType: DeleteSelf
//!   key: Legacy.Api
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, RestructureUsageError};
use crate::node::TocNode;

/// Kind of structural edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestructureAction {
    /// Add fragments at the end of the match's children.
    AppendChild,
    /// Add fragments at the start of the match's children.
    PrependChild,
    /// Add fragments as siblings immediately before the match.
    InsertBefore,
    /// Add fragments as siblings immediately after the match.
    InsertAfter,
    /// Remove the match with its subtree.
    DeleteSelf,
    /// Swap the match for a single fragment.
    ReplaceSelf,
}

/// One keyed edit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocRestructure {
    /// Edit to perform.
    pub action_type: RestructureAction,
    /// Identity of the nodes to edit.
    pub key: String,
    /// Fragments to insert, in order.
    #[serde(default)]
    pub restructured_items: Vec<TocNode>,
}

impl TocRestructure {
    /// Create an operation on `key`.
    #[must_use]
    pub fn new(action_type: RestructureAction, key: impl Into<String>, items: Vec<TocNode>) -> Self {
        Self {
            action_type,
            key: key.into(),
            restructured_items: items,
        }
    }
}

/// Apply `operations` to `tree` in order.
///
/// Zero matches for a key is a no-op. Sibling edits matching the root are
/// skipped with a warning, since the root has no parent.
///
/// # Errors
///
/// Returns [`RestructureUsageError::ReplaceSelfArity`] for a `ReplaceSelf`
/// without exactly one fragment. Operations before it stay applied.
pub fn restructure(
    tree: &mut TocNode,
    operations: &[TocRestructure],
) -> Result<(), RestructureUsageError> {
    for operation in operations {
        apply(tree, operation)?;
    }
    Ok(())
}

fn apply(tree: &mut TocNode, operation: &TocRestructure) -> Result<(), RestructureUsageError> {
    let items = &operation.restructured_items;
    if operation.action_type == RestructureAction::ReplaceSelf && items.len() != 1 {
        return Err(RestructureUsageError::ReplaceSelfArity {
            key: operation.key.clone(),
            count: items.len(),
        });
    }

    let mut matches = Vec::new();
    collect_matches(tree, &operation.key, &mut Vec::new(), &mut matches);
    tracing::debug!(
        action = ?operation.action_type,
        key = %operation.key,
        matches = matches.len(),
        "Applying TOC restructure"
    );

    // Reverse pre-order: later siblings and descendants first, so the index
    // paths of the remaining matches stay valid.
    for path in matches.iter().rev() {
        match operation.action_type {
            RestructureAction::AppendChild => {
                if let Some(node) = node_at_mut(tree, path) {
                    node.items.extend(items.iter().cloned());
                }
            }
            RestructureAction::PrependChild => {
                if let Some(node) = node_at_mut(tree, path) {
                    node.items.splice(0..0, items.iter().cloned());
                }
            }
            action => {
                let Some((&index, parent_path)) = path.split_last() else {
                    tracing::warn!(
                        action = ?action,
                        key = %operation.key,
                        "Restructure target is the TOC root, skipping"
                    );
                    continue;
                };
                let Some(parent) = node_at_mut(tree, parent_path) else {
                    continue;
                };
                match action {
                    RestructureAction::InsertBefore => {
                        parent.items.splice(index..index, items.iter().cloned());
                    }
                    RestructureAction::InsertAfter => {
                        parent
                            .items
                            .splice(index + 1..index + 1, items.iter().cloned());
                    }
                    RestructureAction::DeleteSelf => {
                        parent.items.remove(index);
                    }
                    RestructureAction::ReplaceSelf => {
                        parent.items.splice(index..=index, items.iter().cloned());
                    }
                    RestructureAction::AppendChild | RestructureAction::PrependChild => {}
                }
            }
        }
    }
    Ok(())
}

/// Index paths of every node whose identity is `key`, in pre-order.
fn collect_matches(node: &TocNode, key: &str, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    if node.identity() == Some(key) {
        out.push(path.clone());
    }
    for (index, child) in node.items.iter().enumerate() {
        path.push(index);
        collect_matches(child, key, path, out);
        path.pop();
    }
}

fn node_at_mut<'a>(root: &'a mut TocNode, path: &[usize]) -> Option<&'a mut TocNode> {
    path.iter()
        .try_fold(root, |node, &index| node.items.get_mut(index))
}

/// Parse an operation list from YAML or JSON.
///
/// # Errors
///
/// Returns [`ParseError`] with the position of the malformed entry.
pub fn parse_restructures(content: &str, file: &str) -> Result<Vec<TocRestructure>, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    if file.ends_with(".json") {
        return serde_json::from_str(content)
            .map_err(|e| ParseError::new(file, e.line(), e.column(), e.to_string()));
    }
    serde_yaml::from_str(content).map_err(|e| {
        let (line, column) = e
            .location()
            .map_or((0, 0), |loc| (loc.line(), loc.column()));
        ParseError::new(file, line, column, e.to_string())
    })
}
