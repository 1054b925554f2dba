//! Cross-file TOC reference expansion.
//!
//! A node is a *reference* when its `href` names another TOC file
//! (`sub/toc.yml`) or a folder (`sub/`, meaning the TOC inside it), or when it
//! carries a `tocHref`. Expansion replaces every reference with the items of
//! the referenced file, itself fully expanded, until no reference remains.
//!
//! # Algorithm
//!
//! Depth-first over the tree. On a reference:
//! 1. Fail with [`TocError::CircularReference`] if the target is already
//!    being expanded on the current root-to-here path
//! 2. Load and fully expand the target
//! 3. Re-anchor the target's relative links onto the current file
//! 4. Splice the target's items in as this node's first children, turn the
//!    node into a container (`href` becomes `homepage`, else `topicHref`),
//!    clear `tocHref`, and stamp `included_from`
//!
//! A missing target is a [`TocWarning::BrokenReference`]: the node is left
//! as written and expansion continues.
//!
//! # Concurrency
//!
//! The in-progress chain lives in an [`ExpandContext`] value threaded through
//! the recursion, so unrelated expansions never share cycle state.
//! [`TocPool`] memoizes expanded trees by path behind an `RwLock` and expands
//! independent roots on the rayon thread pool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use rayon::prelude::*;

use crate::error::{TocError, TocWarning};
use crate::node::TocNode;
use crate::path::{self, TOC_FILE_NAMES};
use crate::source::{ContentRegistry, TocSource};

/// Chain of TOC files currently being expanded, root first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpandContext {
    chain: Vec<String>,
}

impl ExpandContext {
    /// Create an empty context for a new root expansion.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files on the current path, root first.
    #[must_use]
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Context for expanding `file` one level deeper.
    ///
    /// # Errors
    ///
    /// Returns [`TocError::CircularReference`] naming the full chain if
    /// `file` is already on the path.
    pub fn enter(&self, file: &str) -> Result<Self, TocError> {
        let mut chain = self.chain.clone();
        chain.push(file.to_owned());
        if self.chain.iter().any(|entered| entered == file) {
            return Err(TocError::CircularReference { chain });
        }
        Ok(Self { chain })
    }
}

/// Result of expanding a single tree.
#[derive(Debug)]
pub struct Expansion {
    /// Tree without cross-file references.
    pub tree: TocNode,
    /// Recoverable problems found along the way.
    pub warnings: Vec<TocWarning>,
}

type Memo = RwLock<HashMap<String, Arc<TocNode>>>;

/// Recursive expansion over a shared memo and warning sink.
struct Expander<'a> {
    source: &'a dyn TocSource,
    memo: &'a Memo,
    warnings: &'a Mutex<Vec<TocWarning>>,
}

impl Expander<'_> {
    /// Load and expand the TOC at `file`, or `None` if it doesn't exist.
    fn expand_file(
        &self,
        file: &str,
        ctx: &ExpandContext,
    ) -> Result<Option<Arc<TocNode>>, TocError> {
        let ctx = ctx.enter(file)?;

        if let Some(tree) = self.memo.read().unwrap().get(file) {
            tracing::debug!(file, "Expanded TOC served from memo");
            return Ok(Some(Arc::clone(tree)));
        }

        let Some(mut tree) = self.source.load(file)? else {
            return Ok(None);
        };
        self.expand_node(&mut tree, file, &ctx)?;

        let mut memo = self.memo.write().unwrap();
        let tree = memo
            .entry(file.to_owned())
            .or_insert_with(|| Arc::new(tree));
        Ok(Some(Arc::clone(tree)))
    }

    fn expand_node(
        &self,
        node: &mut TocNode,
        file: &str,
        ctx: &ExpandContext,
    ) -> Result<(), TocError> {
        let mut included = Vec::new();

        if let Some(reference) = reference_target(node, file)? {
            match self.resolve_reference(&reference, file, ctx)? {
                Some((target, tree)) => {
                    let rel_dir =
                        path::parent_dir(&path::relative_to(path::parent_dir(file), &target))
                            .to_owned();
                    included = tree.items.clone();
                    for item in &mut included {
                        item.rebase_paths(&rel_dir);
                    }

                    node.href = node
                        .homepage
                        .clone()
                        .or_else(|| node.topic_href.clone().filter(|h| !is_toc_reference(h)));
                    node.toc_href = None;
                    node.included_from = Some(target);
                }
                None => {
                    let mut warnings = self.warnings.lock().unwrap();
                    let seen = warnings.iter().any(|w| {
                        matches!(w, TocWarning::BrokenReference { file: f, href } if f == file && *href == reference)
                    });
                    if !seen {
                        tracing::warn!(file, href = %reference, "Unable to resolve TOC reference");
                        warnings.push(TocWarning::BrokenReference {
                            file: file.to_owned(),
                            href: reference,
                        });
                    }
                }
            }
        }

        for item in &mut node.items {
            self.expand_node(item, file, ctx)?;
        }
        if !included.is_empty() {
            included.append(&mut node.items);
            node.items = included;
        }
        Ok(())
    }

    /// Find and expand the TOC a reference points at.
    ///
    /// Folder references probe the recognized TOC file names in order.
    fn resolve_reference(
        &self,
        reference: &str,
        file: &str,
        ctx: &ExpandContext,
    ) -> Result<Option<(String, Arc<TocNode>)>, TocError> {
        let (target_path, _) = path::split_suffix(reference);
        let target = path::join(path::parent_dir(file), target_path);

        if path::is_folder_reference(reference) {
            for name in TOC_FILE_NAMES {
                let candidate = format!("{target}{name}");
                if let Some(tree) = self.expand_file(&candidate, ctx)? {
                    return Ok(Some((candidate, tree)));
                }
            }
            return Ok(None);
        }

        Ok(self.expand_file(&target, ctx)?.map(|tree| (target, tree)))
    }
}

/// Check if an href points at another TOC.
fn is_toc_reference(href: &str) -> bool {
    path::is_relative(href) && (path::is_toc_file(href) || path::is_folder_reference(href))
}

/// The reference a node carries, if any.
///
/// `href` wins when it names a TOC; a bare `tocHref` is only accepted when
/// `href` is absent or equal to the node's `homepage`.
fn reference_target(node: &TocNode, file: &str) -> Result<Option<String>, TocError> {
    if let Some(href) = node.href.as_deref().filter(|h| is_toc_reference(h)) {
        return Ok(Some(href.to_owned()));
    }

    let Some(toc_href) = node.toc_href.as_deref().filter(|h| path::is_relative(h)) else {
        return Ok(None);
    };

    if let Some(href) = node.href.as_deref()
        && node.homepage.as_deref() != Some(href)
    {
        return Err(TocError::AmbiguousReference {
            file: file.to_owned(),
            toc_href: toc_href.to_owned(),
            href: href.to_owned(),
        });
    }

    Ok(Some(toc_href.to_owned()))
}

/// Expand a single tree that was loaded from `file`.
///
/// Referenced TOC files are loaded through `source`. Each distinct file is
/// loaded at most once per call.
///
/// # Errors
///
/// Returns [`TocError::CircularReference`] on reference cycles,
/// [`TocError::AmbiguousReference`] for nodes with both a TOC pointer and a
/// content link, and any error raised by `source`.
///
/// # Panics
///
/// Panics if an internal lock is poisoned.
pub fn expand_tree(
    mut tree: TocNode,
    file: &str,
    source: &dyn TocSource,
) -> Result<Expansion, TocError> {
    let memo = Memo::default();
    let warnings = Mutex::new(Vec::new());
    let expander = Expander {
        source,
        memo: &memo,
        warnings: &warnings,
    };

    let ctx = ExpandContext::new().enter(file)?;
    expander.expand_node(&mut tree, file, &ctx)?;

    Ok(Expansion {
        tree,
        warnings: warnings.into_inner().unwrap(),
    })
}

/// Shared pool of expanded TOC trees.
///
/// A TOC referenced from several parents is loaded and expanded once. Trees
/// are immutable once stored, so readers may share them freely.
///
/// # Thread Safety
///
/// - `expand()` may be called concurrently for unrelated roots
/// - `expand_all()` fans out over the rayon thread pool
pub struct TocPool {
    source: Arc<dyn TocSource>,
    memo: Memo,
    warnings: Mutex<Vec<TocWarning>>,
}

impl TocPool {
    /// Create an empty pool loading from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn TocSource>) -> Self {
        Self {
            source,
            memo: Memo::default(),
            warnings: Mutex::new(Vec::new()),
        }
    }

    fn expander(&self) -> Expander<'_> {
        Expander {
            source: self.source.as_ref(),
            memo: &self.memo,
            warnings: &self.warnings,
        }
    }

    /// Expand the TOC at root-relative `file`.
    ///
    /// # Errors
    ///
    /// Returns [`TocError::NotFound`] if `file` doesn't exist, and the errors
    /// of [`expand_tree`] otherwise.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn expand(&self, file: &str) -> Result<Arc<TocNode>, TocError> {
        self.expander()
            .expand_file(file, &ExpandContext::new())?
            .ok_or_else(|| TocError::NotFound(file.to_owned()))
    }

    /// Expand many TOC files concurrently.
    ///
    /// Results are returned in input order.
    #[must_use]
    pub fn expand_all(&self, files: &[String]) -> Vec<(String, Result<Arc<TocNode>, TocError>)> {
        let start = Instant::now();
        let results: Vec<_> = files
            .par_iter()
            .map(|file| (file.clone(), self.expand(file)))
            .collect();

        tracing::info!(
            toc_count = files.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "TOC files expanded"
        );
        results
    }

    /// Previously expanded tree for `file`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get(&self, file: &str) -> Option<Arc<TocNode>> {
        self.memo.read().unwrap().get(file).cloned()
    }

    /// Warnings recorded so far, in detection order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn warnings(&self) -> Vec<TocWarning> {
        self.warnings.lock().unwrap().clone()
    }
}

/// Report content links in `tree` that `registry` doesn't know.
///
/// Only relative links that are not TOC references are checked, against
/// their root-relative form. Each broken link is logged.
#[must_use]
pub fn validate_links(
    tree: &TocNode,
    file: &str,
    registry: &dyn ContentRegistry,
) -> Vec<TocWarning> {
    fn walk(
        node: &TocNode,
        file: &str,
        dir: &str,
        registry: &dyn ContentRegistry,
        out: &mut Vec<TocWarning>,
    ) {
        for link in [&node.href, &node.topic_href, &node.homepage]
            .into_iter()
            .flatten()
        {
            if !path::is_relative(link) || is_toc_reference(link) {
                continue;
            }
            let (link_path, _) = path::split_suffix(link);
            if !registry.contains(&path::join(dir, link_path))
                && !out.iter().any(|w| matches!(w, TocWarning::BrokenLink { href, .. } if href == link))
            {
                tracing::warn!(file, href = %link, "TOC link target does not exist");
                out.push(TocWarning::BrokenLink {
                    file: file.to_owned(),
                    href: link.clone(),
                });
            }
        }
        for item in &node.items {
            walk(item, file, dir, registry, out);
        }
    }

    let mut warnings = Vec::new();
    walk(tree, file, path::parent_dir(file), registry, &mut warnings);
    warnings
}
