//! TOC source and content registry abstractions.
//!
//! The expander never touches the file system directly. It asks a
//! [`TocSource`] to load a TOC by its root-relative identity, and checks
//! link targets against a [`ContentRegistry`].
//!
//! # Implementations
//!
//! - [`FsTocSource`]: reads and parses files under a docset root directory
//! - [`MockTocSource`]: in-memory documents for testing (behind `mock` feature)
//! - Any `Fn(&str) -> Result<Option<TocNode>, TocError>` closure

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::error::TocError;
use crate::loader::load_toc;
use crate::node::TocNode;

/// Loads TOC trees by root-relative path.
pub trait TocSource: Send + Sync {
    /// Load and parse the TOC file at `path`.
    ///
    /// Returns `Ok(None)` when no such file exists so the caller can report a
    /// broken reference instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`TocError`] if the file exists but cannot be read or parsed.
    fn load(&self, path: &str) -> Result<Option<TocNode>, TocError>;
}

impl<F> TocSource for F
where
    F: Fn(&str) -> Result<Option<TocNode>, TocError> + Send + Sync,
{
    fn load(&self, path: &str) -> Result<Option<TocNode>, TocError> {
        self(path)
    }
}

/// Registry of content files known to the build.
pub trait ContentRegistry: Send + Sync {
    /// Check if a root-relative content path exists.
    fn contains(&self, path: &str) -> bool;
}

impl ContentRegistry for HashSet<String> {
    fn contains(&self, path: &str) -> bool {
        HashSet::contains(self, path)
    }
}

impl ContentRegistry for BTreeSet<String> {
    fn contains(&self, path: &str) -> bool {
        BTreeSet::contains(self, path)
    }
}

/// File-system [`TocSource`] rooted at a docset directory.
#[derive(Debug, Clone)]
pub struct FsTocSource {
    root: PathBuf,
}

impl FsTocSource {
    /// Create a source reading from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Docset root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TocSource for FsTocSource {
    fn load(&self, path: &str) -> Result<Option<TocNode>, TocError> {
        let file_path = self.root.join(path);
        let content = match std::fs::read_to_string(&file_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(TocError::Io {
                    path: file_path,
                    source,
                });
            }
        };
        Ok(Some(load_toc(&content, path)?))
    }
}

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTocSource;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::collections::HashMap;
    use std::sync::RwLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::TocSource;
    use crate::error::TocError;
    use crate::loader::load_toc;
    use crate::node::TocNode;

    /// In-memory [`TocSource`] for tests.
    ///
    /// Documents are parsed on every load, like a real file. The number of
    /// successful loads is counted so memoization can be asserted.
    #[derive(Debug, Default)]
    pub struct MockTocSource {
        files: RwLock<HashMap<String, String>>,
        loads: AtomicUsize,
    }

    impl MockTocSource {
        /// Create an empty source.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a document at a root-relative path.
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[must_use]
        pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
            self.files
                .write()
                .unwrap()
                .insert(path.into(), content.into());
            self
        }

        /// Number of documents loaded so far.
        #[must_use]
        pub fn load_count(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    impl TocSource for MockTocSource {
        fn load(&self, path: &str) -> Result<Option<TocNode>, TocError> {
            let content = self.files.read().unwrap().get(path).cloned();
            let Some(content) = content else {
                return Ok(None);
            };
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Some(load_toc(&content, path)?))
        }
    }
}
