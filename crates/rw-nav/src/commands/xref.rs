//! `rw-nav xref` command implementation.

use clap::Args;
use rw_config::{CliSettings, XRefConfig};
use rw_xref::{XRefCollection, XRefMapDownloader};

use super::ConfigArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the xref command.
#[derive(Args)]
pub(crate) struct XRefArgs {
    /// Uids to resolve.
    #[arg(required = true)]
    uids: Vec<String>,

    #[command(flatten)]
    config: ConfigArgs,

    /// Xref map location, repeatable (replaces configured maps).
    #[arg(long = "map")]
    maps: Vec<String>,

    /// HTTP timeout in seconds (overrides config).
    #[arg(long)]
    timeout: Option<u64>,

    /// Fetch all maps concurrently before resolving.
    #[arg(long)]
    prefetch: bool,

    /// File reported as the referencing file for unresolved uids.
    #[arg(long, default_value = "<command line>")]
    from: String,
}

impl XRefArgs {
    /// Execute the xref command.
    ///
    /// Prints one `uid<TAB>href` line per resolved uid.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, a required map cannot be
    /// loaded, or any uid stays unresolved.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load(CliSettings {
            xref_maps: (!self.maps.is_empty()).then(|| self.maps.clone()),
            timeout_secs: self.timeout,
            ..Default::default()
        })?;
        let collection = build_collection(&config.xref_resolved);

        if self.prefetch {
            collection.prefetch().await?;
        }

        let mut unresolved = 0;
        for uid in &self.uids {
            match collection.resolve(uid, &self.from).await? {
                Some(spec) => {
                    output.print(&format!("{uid}\t{}", spec.href.unwrap_or_default()));
                }
                None => {
                    output.warning(&format!("{uid}: unresolved"));
                    unresolved += 1;
                }
            }
        }

        if unresolved > 0 {
            return Err(CliError::Validation(format!(
                "{unresolved} of {} uids unresolved",
                self.uids.len()
            )));
        }
        Ok(())
    }
}

fn build_collection(config: &XRefConfig) -> XRefCollection {
    let mut collection =
        XRefCollection::new(XRefMapDownloader::new(config.timeout())).with_base_dir(&config.base_dir);
    for folder in &config.fallback_folders {
        collection = collection.with_fallback_folder(folder);
    }
    for location in &config.maps {
        collection = collection.with_location(location);
    }
    collection
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[tokio::test]
    async fn test_build_collection_from_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let shared = temp_dir.path().join("shared");
        fs::create_dir(&shared).unwrap();
        fs::write(
            shared.join("xrefmap.yml"),
            "references:\n- uid: Shared.Type\n  href: https://docs.example.com/shared.html\n",
        )
        .unwrap();

        let config = XRefConfig {
            maps: vec!["xrefmap.yml".to_owned()],
            base_dir: temp_dir.path().to_path_buf(),
            fallback_folders: vec![shared],
            timeout_secs: 5,
        };
        let collection = build_collection(&config);

        let spec = collection.find("Shared.Type").await.unwrap().unwrap();
        assert_eq!(
            spec.href.as_deref(),
            Some("https://docs.example.com/shared.html")
        );
    }
}
