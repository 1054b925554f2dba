//! CLI command implementations.

pub(crate) mod nearest;
pub(crate) mod toc;
pub(crate) mod xref;

use std::path::{Path, PathBuf};

use clap::Args;
use rw_config::{CliSettings, Config};

use crate::error::CliError;

pub(crate) use nearest::NearestArgs;
pub(crate) use toc::TocArgs;
pub(crate) use xref::XRefArgs;

/// Configuration arguments shared by all commands.
#[derive(Args)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover rw.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Docset root directory (overrides config).
    #[arg(short, long)]
    root_dir: Option<PathBuf>,
}

impl ConfigArgs {
    /// Load configuration with command-specific overrides.
    pub(crate) fn load(&self, settings: CliSettings) -> Result<Config, CliError> {
        let settings = CliSettings {
            root_dir: self.root_dir.clone(),
            ..settings
        };
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }
}

/// All files under `root`, as sorted root-relative `/`-separated paths.
pub(crate) fn discover_files(root: &Path) -> Result<Vec<String>, CliError> {
    let pattern = format!("{}/**/*", glob::Pattern::escape(&root.to_string_lossy()));
    let entries = glob::glob(&pattern).map_err(|e| CliError::Validation(e.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CliError::Io(e.into()))?;
        if !path.is_file() {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(root) {
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    files.sort();
    Ok(files)
}

/// TOC files under `root`, as root-relative paths.
pub(crate) fn discover_tocs(root: &Path) -> Result<Vec<String>, CliError> {
    let mut tocs = discover_files(root)?;
    tocs.retain(|file| rw_toc::path::is_toc_file(file));
    Ok(tocs)
}
