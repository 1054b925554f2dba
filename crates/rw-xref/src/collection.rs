//! Priority-ordered resolution over several xref maps.
//!
//! Maps are consulted strictly in declaration order and the first one that
//! resolves a uid wins. Each declared location is fetched lazily, at most
//! once, and only when every earlier map failed to resolve the uid being
//! looked up. [`XRefCollection::prefetch`] may start all fetches up front;
//! it never changes which map wins.
//!
//! # Failure Policy
//!
//! - Required maps (local by default): a failed fetch fails the lookup
//! - Optional maps (remote by default): a failed fetch is logged once and
//!   the map is skipped from then on

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::OnceCell;

use crate::download::XRefMapDownloader;
use crate::error::{DownloadError, DownloadErrorKind};
use crate::href;
use crate::map::{XRefMap, XRefSpec};

/// Declared origin of one map.
#[derive(Clone, Debug)]
pub enum XRefMapSource {
    /// Map already in memory.
    Loaded(Arc<XRefMap>),
    /// Map fetched from a URL or local path on first use.
    Location {
        /// URL or path, relative paths resolved against the base directory
        /// and then the fallback folders.
        location: String,
        /// Whether a failed fetch is fatal.
        required: bool,
    },
}

impl XRefMapSource {
    /// Source for `location`, required unless it is remote.
    #[must_use]
    pub fn location(location: impl Into<String>) -> Self {
        let location = location.into();
        let required = !href::is_remote(&location);
        Self::Location { location, required }
    }
}

type SlotState = Result<Option<Arc<XRefMap>>, DownloadError>;

struct Slot {
    source: XRefMapSource,
    state: OnceCell<SlotState>,
}

/// Ordered set of xref maps answering `find(uid)`.
///
/// # Thread Safety
///
/// Lookups take `&self` and may run concurrently; concurrent first uses of
/// one map share a single fetch.
pub struct XRefCollection {
    downloader: XRefMapDownloader,
    slots: Vec<Slot>,
    base_dir: Option<PathBuf>,
    fallback_folders: Vec<PathBuf>,
}

impl Default for XRefCollection {
    fn default() -> Self {
        Self::new(XRefMapDownloader::default())
    }
}

impl XRefCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new(downloader: XRefMapDownloader) -> Self {
        Self {
            downloader,
            slots: Vec::new(),
            base_dir: None,
            fallback_folders: Vec::new(),
        }
    }

    /// Append a map source; earlier sources take precedence.
    #[must_use]
    pub fn with_source(mut self, source: XRefMapSource) -> Self {
        self.slots.push(Slot {
            source,
            state: OnceCell::new(),
        });
        self
    }

    /// Append an in-memory map.
    #[must_use]
    pub fn with_map(self, map: XRefMap) -> Self {
        self.with_source(XRefMapSource::Loaded(Arc::new(map)))
    }

    /// Append a map location with the default required policy.
    #[must_use]
    pub fn with_location(self, location: impl Into<String>) -> Self {
        self.with_source(XRefMapSource::location(location))
    }

    /// Set the directory relative local locations are resolved against.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Add a folder searched for relative local locations missing from the
    /// base directory.
    #[must_use]
    pub fn with_fallback_folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_folders.push(dir.into());
        self
    }

    /// Number of declared maps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no maps are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Resolve `uid` against the maps in declaration order.
    ///
    /// Returns `Ok(None)` if no map knows the uid.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if a required map that had to be consulted
    /// could not be loaded.
    pub async fn find(&self, uid: &str) -> Result<Option<XRefSpec>, DownloadError> {
        for slot in &self.slots {
            let Some(map) = self.map_for(slot).await? else {
                continue;
            };
            if let Some(spec) = map.find(uid) {
                return Ok(Some(spec));
            }
        }
        Ok(None)
    }

    /// Like [`find`](Self::find), logging a warning naming `file` when the
    /// uid is unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] under the same conditions as `find`.
    pub async fn resolve(&self, uid: &str, file: &str) -> Result<Option<XRefSpec>, DownloadError> {
        let spec = self.find(uid).await?;
        if spec.is_none() {
            tracing::warn!(file, uid, "Unresolved cross reference");
        }
        Ok(spec)
    }

    /// Fetch every declared map concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first required-map failure in declaration order.
    pub async fn prefetch(&self) -> Result<(), DownloadError> {
        let results = join_all(self.slots.iter().map(|slot| self.map_for(slot))).await;
        results.into_iter().try_for_each(|r| r.map(drop))
    }

    async fn map_for(&self, slot: &Slot) -> SlotState {
        match &slot.source {
            XRefMapSource::Loaded(map) => Ok(Some(Arc::clone(map))),
            XRefMapSource::Location { location, required } => slot
                .state
                .get_or_init(|| self.fetch(location, *required))
                .await
                .clone(),
        }
    }

    async fn fetch(&self, location: &str, required: bool) -> SlotState {
        match self.download_first(location).await {
            Ok(map) => Ok(Some(Arc::new(map))),
            Err(e) if !required => {
                tracing::warn!(location, error = %e, "Skipping optional xref map");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Download `location`, probing the base directory and then the fallback
    /// folders for relative local paths.
    async fn download_first(&self, location: &str) -> Result<XRefMap, DownloadError> {
        let candidates = self.candidates(location);
        for candidate in &candidates {
            match self.downloader.download(candidate).await {
                Err(e) if e.is_not_found() => {
                    tracing::debug!(location = %candidate, "Xref map not found, trying next folder");
                }
                result => return result,
            }
        }
        Err(DownloadError::new(location, DownloadErrorKind::NotFound))
    }

    fn candidates(&self, location: &str) -> Vec<String> {
        if href::is_remote(location) || Path::new(location).is_absolute() {
            return vec![location.to_owned()];
        }
        let base = self.base_dir.as_deref().map_or_else(
            || location.to_owned(),
            |dir| dir.join(location).to_string_lossy().into_owned(),
        );
        std::iter::once(base)
            .chain(
                self.fallback_folders
                    .iter()
                    .map(|dir| dir.join(location).to_string_lossy().into_owned()),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::map::XRefMapRedirection;

    fn write_map(dir: &Path, name: &str, uid: &str) {
        std::fs::write(
            dir.join(name),
            format!("baseUrl: https://docs.example.com/\nreferences:\n- uid: {uid}\n  href: {uid}.html\n"),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_find_through_redirection() {
        let map = XRefMap::default()
            .with_redirection(XRefMapRedirection::new("System.", "https://x/{0}.html"));
        let collection = XRefCollection::default().with_map(map);

        let spec = collection.find("System.String").await.unwrap().unwrap();
        assert_eq!(spec.href.as_deref(), Some("https://x/String.html"));
    }

    #[tokio::test]
    async fn test_first_declared_map_wins() {
        let collection = XRefCollection::default()
            .with_map(XRefMap::new(vec![XRefSpec::new("A", "https://first/a")]))
            .with_map(XRefMap::new(vec![
                XRefSpec::new("A", "https://second/a"),
                XRefSpec::new("B", "https://second/b"),
            ]));

        let a = collection.find("A").await.unwrap().unwrap();
        let b = collection.find("B").await.unwrap().unwrap();
        assert_eq!(a.href.as_deref(), Some("https://first/a"));
        assert_eq!(b.href.as_deref(), Some("https://second/b"));
        assert!(collection.find("C").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_later_maps_are_fetched_lazily() {
        let temp_dir = tempfile::tempdir().unwrap();
        let collection = XRefCollection::default()
            .with_base_dir(temp_dir.path())
            .with_map(XRefMap::new(vec![XRefSpec::new("A", "https://first/a")]))
            .with_location("missing.yml");

        // resolved before the broken required map is needed
        assert!(collection.find("A").await.unwrap().is_some());

        let err = collection.find("B").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.location, "missing.yml");
        assert!(collection.prefetch().await.is_err());
    }

    #[tokio::test]
    async fn test_local_location_with_fallback_folder() {
        let base = tempfile::tempdir().unwrap();
        let fallback = tempfile::tempdir().unwrap();
        write_map(fallback.path(), "xrefmap.yml", "Shared.Type");

        let collection = XRefCollection::default()
            .with_base_dir(base.path())
            .with_fallback_folder(fallback.path())
            .with_location("xrefmap.yml");

        let spec = collection.find("Shared.Type").await.unwrap().unwrap();
        assert_eq!(
            spec.href.as_deref(),
            Some("https://docs.example.com/Shared.Type.html")
        );
    }

    #[tokio::test]
    async fn test_base_dir_takes_precedence_over_fallback() {
        let base = tempfile::tempdir().unwrap();
        let fallback = tempfile::tempdir().unwrap();
        write_map(base.path(), "xrefmap.yml", "Base.Type");
        write_map(fallback.path(), "xrefmap.yml", "Fallback.Type");

        let collection = XRefCollection::default()
            .with_base_dir(base.path())
            .with_fallback_folder(fallback.path())
            .with_location("xrefmap.yml");

        assert!(collection.find("Base.Type").await.unwrap().is_some());
        assert!(collection.find("Fallback.Type").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_optional_remote_failure_is_skipped() {
        let collection = XRefCollection::new(XRefMapDownloader::new(Duration::from_secs(2)))
            .with_location("http://127.0.0.1:1/xrefmap.yml")
            .with_map(XRefMap::new(vec![XRefSpec::new("A", "https://local/a")]));

        let spec = collection.resolve("A", "guide/intro.md").await.unwrap();
        assert_eq!(spec.unwrap().href.as_deref(), Some("https://local/a"));
        assert!(collection.resolve("Z", "guide/intro.md").await.unwrap().is_none());
        collection.prefetch().await.unwrap();
    }

    #[tokio::test]
    async fn test_prefetch_loads_all_maps() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_map(temp_dir.path(), "a.yml", "A");
        write_map(temp_dir.path(), "b.yml", "B");

        let collection = XRefCollection::default()
            .with_base_dir(temp_dir.path())
            .with_location("a.yml")
            .with_location("b.yml");
        collection.prefetch().await.unwrap();

        assert!(collection.slots.iter().all(|slot| slot.state.initialized()));
        assert_eq!(collection.len(), 2);
        assert!(collection.find("B").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_prefetch_keeps_declared_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_map(temp_dir.path(), "primary.yml", "Shared.Type");

        // the in-memory map is ready immediately, the file map has to load
        let collection = XRefCollection::default()
            .with_base_dir(temp_dir.path())
            .with_location("primary.yml")
            .with_map(XRefMap::new(vec![XRefSpec::new(
                "Shared.Type",
                "https://secondary/shared.html",
            )]));
        collection.prefetch().await.unwrap();

        let spec = collection.find("Shared.Type").await.unwrap().unwrap();
        assert_eq!(
            spec.href.as_deref(),
            Some("https://docs.example.com/Shared.Type.html")
        );
    }

    #[test]
    fn test_source_policy_defaults() {
        assert!(matches!(
            XRefMapSource::location("maps/xrefmap.yml"),
            XRefMapSource::Location { required: true, .. }
        ));
        assert!(matches!(
            XRefMapSource::location("https://example.com/xrefmap.yml"),
            XRefMapSource::Location { required: false, .. }
        ));
    }

    #[test]
    fn test_collection_is_send_sync() {
        static_assertions::assert_impl_all!(XRefCollection: Send, Sync);
    }
}
