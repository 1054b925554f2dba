//! Cross-reference map loading errors.

/// Failure to load one xref map.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Failed to load xref map {location}: {kind}")]
pub struct DownloadError {
    /// Location as declared or probed.
    pub location: String,
    /// What went wrong.
    pub kind: DownloadErrorKind,
}

impl DownloadError {
    pub(crate) fn new(location: impl Into<String>, kind: DownloadErrorKind) -> Self {
        Self {
            location: location.into(),
            kind,
        }
    }

    /// Check if the map simply doesn't exist at its location.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == DownloadErrorKind::NotFound
    }
}

/// Kind of xref map loading error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DownloadErrorKind {
    #[error("not found")]
    NotFound,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("corrupt map: {0}")]
    Corrupt(String),
}
