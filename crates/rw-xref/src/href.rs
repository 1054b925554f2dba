//! Href and location helpers.
//!
//! Map locations and base URLs are either absolute URLs (`https://...`) or
//! local paths. Hrefs inside a map are resolved against its base URL with
//! URL semantics for URLs and plain path joining for local bases.

use std::path::Path;

use url::Url;

/// Parse `value` as an absolute URL with a real scheme.
///
/// Single-letter schemes are rejected so drive letters (`C:\docs`) stay paths.
fn parse_absolute(value: &str) -> Option<Url> {
    Url::parse(value).ok().filter(|url| url.scheme().len() > 1)
}

/// Check if an href carries a URI scheme.
#[must_use]
pub fn has_scheme(href: &str) -> bool {
    parse_absolute(href).is_some()
}

/// Check if a map location is fetched over HTTP(S).
#[must_use]
pub fn is_remote(location: &str) -> bool {
    parse_absolute(location).is_some_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Directory of a map location.
///
/// URLs keep a trailing slash so they can serve as a join base. Local paths
/// are returned without one.
#[must_use]
pub fn directory_of(location: &str) -> String {
    if let Some(url) = parse_absolute(location) {
        return url
            .join("./")
            .map_or_else(|_| location.to_owned(), String::from);
    }
    Path::new(location)
        .parent()
        .map(|dir| dir.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

/// Resolve `href` against `base`.
///
/// Hrefs with a scheme are returned unchanged. URL bases use
/// [`Url::join`], so a base without a trailing slash replaces its last
/// segment. Local bases are treated as directories.
#[must_use]
pub fn join(base: &str, href: &str) -> String {
    if base.is_empty() || has_scheme(href) {
        return href.to_owned();
    }
    if let Some(url) = parse_absolute(base) {
        return url
            .join(href)
            .map_or_else(|_| format!("{base}{href}"), String::from);
    }
    if href.starts_with('/') {
        return href.to_owned();
    }
    normalize(&format!("{}/{href}", base.trim_end_matches('/')))
}

/// Collapse `.` and `..` segments of a local path, keeping a leading `/`.
#[must_use]
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." if parts.last().is_some_and(|last| *last != "..") => {
                parts.pop();
            }
            ".." if absolute => {}
            segment => parts.push(segment),
        }
    }
    let joined = parts.join("/");
    if absolute { format!("/{joined}") } else { joined }
}
