//! Cross-reference resolution for RW.
//!
//! This crate provides:
//! - [`XRefMap`] and [`XRefSpec`]: the published uid to href map format
//! - [`XRefMapDownloader`]: local and HTTP(S) map loading with gzip support
//! - [`XRefCollection`]: priority-ordered lookup across several maps
//!
//! # Quick Start
//!
//! ```no_run
//! # async fn run() -> Result<(), rw_xref::DownloadError> {
//! use rw_xref::XRefCollection;
//!
//! let xrefs = XRefCollection::default()
//!     .with_base_dir("docs")
//!     .with_location("xrefmap.yml")
//!     .with_location("https://example.com/api/xrefmap.yml.gz");
//!
//! if let Some(spec) = xrefs.resolve("System.String", "guide/intro.md").await? {
//!     println!("{:?}", spec.href);
//! }
//! # Ok(())
//! # }
//! ```

mod collection;
mod download;
mod error;
pub mod href;
mod map;

pub use collection::{XRefCollection, XRefMapSource};
pub use download::{XRefMapDownloader, decode};
pub use error::{DownloadError, DownloadErrorKind};
pub use map::{XRefMap, XRefMapRedirection, XRefSpec};
