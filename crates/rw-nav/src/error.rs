//! CLI error types.

use rw_config::ConfigError;
use rw_toc::TocError;
use rw_xref::DownloadError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Toc(#[from] TocError),

    #[error("{0}")]
    Download(#[from] DownloadError),

    #[error("Failed to serialize output: {0}")]
    Serialize(String),

    #[error("{0}")]
    Validation(String),
}
