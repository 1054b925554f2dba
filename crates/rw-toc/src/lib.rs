//! Table-of-contents processing for RW.
//!
//! This crate provides:
//! - [`load_toc`]: markdown and YAML/JSON TOC parsing into [`TocNode`] trees
//! - [`expand_tree`] and [`TocPool`]: cross-file reference expansion
//! - [`restructure`]: keyed structural edits on expanded trees
//! - [`NearestTocResolver`]: nearest owning TOC for a content file
//! - [`flatten`]: pre-order view for templates
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use rw_toc::{FsTocSource, TocPool};
//!
//! let pool = TocPool::new(Arc::new(FsTocSource::new("docs")));
//! let tree = pool.expand("toc.yml")?;
//!
//! for warning in pool.warnings() {
//!     eprintln!("{warning}");
//! }
//! println!("{}", rw_toc::to_yaml(&tree)?);
//! # Ok(())
//! # }
//! ```

mod error;
mod expand;
mod flatten;
mod loader;
mod nearest;
mod node;
pub mod path;
mod restructure;
mod source;

pub use error::{ParseError, RestructureUsageError, TocError, TocWarning};
pub use expand::{ExpandContext, Expansion, TocPool, expand_tree, validate_links};
pub use flatten::{FlatTocItem, flatten};
pub use loader::{TocFormat, load_toc, to_json, to_yaml};
pub use nearest::{NearestToc, NearestTocResolver};
pub use node::TocNode;
pub use restructure::{RestructureAction, TocRestructure, parse_restructures, restructure};
#[cfg(any(test, feature = "mock"))]
pub use source::MockTocSource;
pub use source::{ContentRegistry, FsTocSource, TocSource};
