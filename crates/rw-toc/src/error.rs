//! TOC error and warning types.
//!
//! Fatal conditions are [`TocError`] values that unwind to the caller.
//! Recoverable conditions are [`TocWarning`] values: they are logged and
//! collected, and processing of the remaining tree continues.

use std::path::PathBuf;

/// Malformed TOC source.
///
/// `line` and `column` are 1-based. A value of 0 means the position is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid TOC file {file} at line {line}, column {column}: {message}")]
pub struct ParseError {
    /// Root-relative identity of the TOC file.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    /// Description of the problem.
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(
        file: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }
}

/// Invalid restructure operation usage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestructureUsageError {
    /// `ReplaceSelf` needs exactly one replacement fragment.
    #[error(
        "ReplaceSelf for key {key:?} requires exactly one restructured item, got {count}"
    )]
    ReplaceSelfArity {
        /// Key of the offending operation.
        key: String,
        /// Number of supplied fragments.
        count: usize,
    },
}

/// Fatal TOC processing error.
#[derive(Debug, thiserror::Error)]
pub enum TocError {
    /// Malformed TOC source.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A TOC includes itself through a chain of references.
    #[error("Circular TOC reference: {}", .chain.join(" -> "))]
    CircularReference {
        /// Files in the order they were entered, ending with the repeated one.
        chain: Vec<String>,
    },
    /// Invalid restructure operation.
    #[error(transparent)]
    Restructure(#[from] RestructureUsageError),
    /// Node carries both a TOC pointer and a separate content link.
    #[error(
        "Ambiguous TOC node in {file}: tocHref {toc_href:?} conflicts with href {href:?}"
    )]
    AmbiguousReference {
        /// Owning TOC file.
        file: String,
        /// The node's `tocHref`.
        toc_href: String,
        /// The node's `href`.
        href: String,
    },
    /// Root TOC file does not exist.
    #[error("TOC file not found: {0}")]
    NotFound(String),
    /// I/O error reading a TOC file.
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        /// File-system path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Recoverable TOC diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TocWarning {
    /// Referenced TOC file does not exist; the node keeps its href.
    #[error("{file}: unable to resolve TOC reference {href:?}")]
    BrokenReference {
        /// Owning TOC file.
        file: String,
        /// Unresolved reference as written.
        href: String,
    },
    /// Content link points at a file unknown to the build.
    #[error("{file}: link target {href:?} does not exist")]
    BrokenLink {
        /// Owning TOC file.
        file: String,
        /// Link as written.
        href: String,
    },
}
