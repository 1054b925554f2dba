//! `rw-nav nearest` command implementation.

use clap::Args;
use rw_config::CliSettings;
use rw_toc::NearestTocResolver;

use super::{ConfigArgs, discover_tocs};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the nearest command.
#[derive(Args)]
pub(crate) struct NearestArgs {
    /// Content files, relative to the docset root.
    #[arg(required = true)]
    content: Vec<String>,

    #[command(flatten)]
    config: ConfigArgs,
}

impl NearestArgs {
    /// Execute the nearest command.
    ///
    /// Prints one `content<TAB>toc<TAB>relative path` line per resolved file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the docset root cannot be
    /// scanned, or any content file has no owning TOC.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load(CliSettings::default())?;
        let resolver = NearestTocResolver::new(discover_tocs(&config.toc_resolved.root_dir)?);

        let mut missing = 0;
        for content in &self.content {
            match resolver.resolve(content) {
                Some(nearest) => output.print(&format!(
                    "{content}\t{}\t{}",
                    nearest.toc, nearest.relative_path
                )),
                None => {
                    output.warning(&format!("{content}: no TOC found"));
                    missing += 1;
                }
            }
        }

        if missing > 0 {
            return Err(CliError::Validation(format!(
                "{missing} of {} content files have no TOC",
                self.content.len()
            )));
        }
        Ok(())
    }
}
