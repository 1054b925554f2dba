//! Nearest owning TOC lookup for content files.
//!
//! A content file belongs to the TOC in the deepest directory that contains
//! it, whether or not that TOC links to the file.

use crate::path;

/// Owning TOC of a content file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NearestToc {
    /// Root-relative identity of the TOC file.
    pub toc: String,
    /// Path to the TOC relative to the content file's directory.
    pub relative_path: String,
}

/// Resolves content files to their nearest TOC.
///
/// Candidates are kept sorted by directory depth (deepest first), then by
/// TOC file name priority, then lexicographically, so the first ancestor
/// match is the answer.
#[derive(Clone, Debug, Default)]
pub struct NearestTocResolver {
    tocs: Vec<String>,
}

impl NearestTocResolver {
    /// Create a resolver over the TOC files of a build.
    pub fn new<I, S>(tocs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tocs: Vec<String> = tocs.into_iter().map(Into::into).collect();
        tocs.sort_by(|a, b| {
            path::depth(path::parent_dir(b))
                .cmp(&path::depth(path::parent_dir(a)))
                .then_with(|| path::toc_name_priority(a).cmp(&path::toc_name_priority(b)))
                .then_with(|| a.cmp(b))
        });
        tocs.dedup();
        Self { tocs }
    }

    /// Number of known TOC files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tocs.len()
    }

    /// Check if no TOC files are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tocs.is_empty()
    }

    /// Find the TOC owning root-relative `content`.
    ///
    /// Returns `None` when no TOC directory contains the file.
    #[must_use]
    pub fn resolve(&self, content: &str) -> Option<NearestToc> {
        let content_dir = path::parent_dir(content);
        let toc = self
            .tocs
            .iter()
            .find(|toc| is_ancestor(path::parent_dir(toc), content_dir))?;

        Some(NearestToc {
            toc: toc.clone(),
            relative_path: path::relative_to(content_dir, toc),
        })
    }
}

/// Check if directory `dir` equals or contains directory `child`.
fn is_ancestor(dir: &str, child: &str) -> bool {
    dir.is_empty()
        || child == dir
        || child
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}
