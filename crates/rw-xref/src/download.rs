//! Fetching and decoding xref maps.
//!
//! A location is either an `http(s)://` URL or a local path. Payloads are
//! YAML unless the location ends in `.json`; a trailing `.gz` is ignored for
//! format detection and gzip data is recognized by its magic bytes, so
//! servers that transparently compress are handled as well.

use std::io::Read;
use std::time::{Duration, Instant};

use flate2::read::GzDecoder;
use ureq::Agent;

use crate::error::{DownloadError, DownloadErrorKind};
use crate::href;
use crate::map::XRefMap;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Largest accepted response body.
const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Loads xref maps from disk or over HTTP(S).
///
/// The HTTP agent is shared between downloads for connection pooling.
#[derive(Clone)]
pub struct XRefMapDownloader {
    agent: Agent,
}

impl Default for XRefMapDownloader {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT))
    }
}

impl XRefMapDownloader {
    /// Create a downloader with the given HTTP timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }

    /// Fetch, decode and rebase the map at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if the map is missing, cannot be fetched,
    /// or cannot be decoded.
    pub async fn download(&self, location: &str) -> Result<XRefMap, DownloadError> {
        let start = Instant::now();
        let bytes = if href::is_remote(location) {
            self.fetch_remote(location).await
        } else {
            read_local(location).await
        }
        .map_err(|kind| DownloadError::new(location, kind))?;

        let mut map = decode(&bytes, location).map_err(|kind| DownloadError::new(location, kind))?;
        map.rebase(&href::directory_of(location));

        tracing::debug!(
            location,
            references = map.references.len(),
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Xref map loaded"
        );
        Ok(map)
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, DownloadErrorKind> {
        let agent = self.agent.clone();
        let url = url.to_owned();
        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &url))
            .await
            .map_err(|e| DownloadErrorKind::Http(e.to_string()))?
    }
}

fn fetch_blocking(agent: &Agent, url: &str) -> Result<Vec<u8>, DownloadErrorKind> {
    let response = agent
        .get(url)
        .call()
        .map_err(|e| DownloadErrorKind::Http(e.to_string()))?;

    let status = response.status().as_u16();
    if status == 404 {
        return Err(DownloadErrorKind::NotFound);
    }
    if status >= 400 {
        return Err(DownloadErrorKind::Http(format!("HTTP {status}")));
    }

    let mut body = response.into_body();
    body.with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_vec()
        .map_err(|e| DownloadErrorKind::Io(e.to_string()))
}

async fn read_local(path: &str) -> Result<Vec<u8>, DownloadErrorKind> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DownloadErrorKind::NotFound
        } else {
            DownloadErrorKind::Io(e.to_string())
        }
    })
}

/// Decode a raw payload fetched from `location`.
///
/// # Errors
///
/// Returns [`DownloadErrorKind::Corrupt`] for bad gzip data, invalid UTF-8 or
/// a document that doesn't match the map schema.
pub fn decode(bytes: &[u8], location: &str) -> Result<XRefMap, DownloadErrorKind> {
    let inflated;
    let bytes = if bytes.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(|e| DownloadErrorKind::Corrupt(format!("invalid gzip data: {e}")))?;
        inflated = out;
        inflated.as_slice()
    } else {
        bytes
    };

    let text = std::str::from_utf8(bytes)
        .map_err(|e| DownloadErrorKind::Corrupt(e.to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Ok(XRefMap::default());
    }

    if is_json_location(location) {
        serde_json::from_str(text).map_err(|e| DownloadErrorKind::Corrupt(e.to_string()))
    } else {
        serde_yaml::from_str(text).map_err(|e| DownloadErrorKind::Corrupt(e.to_string()))
    }
}

fn is_json_location(location: &str) -> bool {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or(location)
        .to_ascii_lowercase();
    path.strip_suffix(".gz")
        .unwrap_or(&path)
        .ends_with(".json")
}
