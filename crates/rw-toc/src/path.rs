//! Path helpers for TOC identities and relative links.
//!
//! # Path Convention
//!
//! TOC and content identities are `/`-separated paths relative to the docset
//! root, never file-system paths:
//! - `"toc.yml"` - root TOC
//! - `"guide/toc.md"` - nested TOC
//! - `"guide/setup.md"` - content page
//!
//! Links stored on a [`TocNode`](crate::TocNode) are relative to the file that
//! owns the node. A link is *relative* when it has no URI scheme and does not
//! start with `/`, `#` or `~/`.

/// Recognized TOC file names, in folder-probing priority order.
pub const TOC_FILE_NAMES: [&str; 4] = ["toc.yml", "toc.yaml", "toc.json", "toc.md"];

/// Check if an href carries a URI scheme (`https:`, `mailto:`, `xref:`).
///
/// Single-letter schemes are rejected so Windows drive letters (`C:`) are
/// not mistaken for URIs.
#[must_use]
pub fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Check if an href is relative to the file that contains it.
#[must_use]
pub fn is_relative(href: &str) -> bool {
    !href.is_empty()
        && !has_scheme(href)
        && !href.starts_with('/')
        && !href.starts_with('#')
        && !href.starts_with("~/")
}

/// Split an href into its path part and its `?query#fragment` suffix.
#[must_use]
pub fn split_suffix(href: &str) -> (&str, &str) {
    match href.find(['?', '#']) {
        Some(pos) => href.split_at(pos),
        None => (href, ""),
    }
}

/// Final path segment (empty for folder paths ending in `/`).
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Directory part of a path, without trailing slash.
///
/// `"guide/toc.yml"` → `"guide"`, `"toc.yml"` → `""`.
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Check if an href names a TOC file by its file name.
#[must_use]
pub fn is_toc_file(href: &str) -> bool {
    let (path, _) = split_suffix(href);
    let name = file_name(path);
    TOC_FILE_NAMES
        .iter()
        .any(|candidate| name.eq_ignore_ascii_case(candidate))
}

/// Check if an href is folder shorthand (`"guide/"`) for the TOC inside it.
#[must_use]
pub fn is_folder_reference(href: &str) -> bool {
    let (path, _) = split_suffix(href);
    is_relative(href) && path.ends_with('/')
}

/// Priority of a TOC file name within one directory (lower wins).
#[must_use]
pub(crate) fn toc_name_priority(path: &str) -> usize {
    let name = file_name(path);
    TOC_FILE_NAMES
        .iter()
        .position(|candidate| name.eq_ignore_ascii_case(candidate))
        .unwrap_or(TOC_FILE_NAMES.len())
}

/// Collapse `.` and `..` segments.
///
/// Leading `..` segments that climb above the root are kept. A trailing
/// slash is preserved so folder references stay folder references.
#[must_use]
pub fn normalize(path: &str) -> String {
    let trailing_slash = path.ends_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            segment => parts.push(segment),
        }
    }

    let mut normalized = parts.join("/");
    if trailing_slash && !normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Join a relative path onto a directory and normalize the result.
#[must_use]
pub fn join(dir: &str, relative: &str) -> String {
    if dir.is_empty() {
        normalize(relative)
    } else {
        normalize(&format!("{dir}/{relative}"))
    }
}

/// Re-anchor a relative href onto `dir`, keeping its query and fragment.
///
/// Non-relative hrefs are returned unchanged.
#[must_use]
pub fn rebase(href: &str, dir: &str) -> String {
    if dir.is_empty() || !is_relative(href) {
        return href.to_owned();
    }
    let (path, suffix) = split_suffix(href);
    format!("{}{suffix}", join(dir, path))
}

/// Express a root-relative `target` relative to the root-relative `from_dir`.
///
/// `relative_to("a/b", "a/toc.yml")` → `"../toc.yml"`.
#[must_use]
pub fn relative_to(from_dir: &str, target: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts = vec![".."; from.len() - common];
    parts.extend(&to[common..]);
    parts.join("/")
}

/// Number of directory segments in a directory path.
#[must_use]
pub(crate) fn depth(dir: &str) -> usize {
    dir.split('/').filter(|s| !s.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://example.com"));
        assert!(has_scheme("mailto:a@b.c"));
        assert!(has_scheme("xref:System.String"));
        assert!(!has_scheme("C:/docs/toc.yml"));
        assert!(!has_scheme("guide/setup.md"));
        assert!(!has_scheme("1abc:foo"));
    }

    #[test]
    fn test_is_relative() {
        assert!(is_relative("guide.md"));
        assert!(is_relative("../shared/toc.yml"));
        assert!(!is_relative(""));
        assert!(!is_relative("/abs/page.md"));
        assert!(!is_relative("#anchor"));
        assert!(!is_relative("~/root.md"));
        assert!(!is_relative("https://example.com/page"));
    }

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("a.md#intro"), ("a.md", "#intro"));
        assert_eq!(split_suffix("a.md?tabs=x#y"), ("a.md", "?tabs=x#y"));
        assert_eq!(split_suffix("a.md"), ("a.md", ""));
    }

    #[test]
    fn test_is_toc_file_case_insensitive() {
        assert!(is_toc_file("sub/toc.yml"));
        assert!(is_toc_file("sub/TOC.md"));
        assert!(is_toc_file("toc.json#top"));
        assert!(!is_toc_file("sub/index.md"));
        assert!(!is_toc_file("sub/"));
    }

    #[test]
    fn test_is_folder_reference() {
        assert!(is_folder_reference("guide/"));
        assert!(is_folder_reference("../shared/"));
        assert!(!is_folder_reference("guide"));
        assert!(!is_folder_reference("https://example.com/"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a/./b/../c.md"), "a/c.md");
        assert_eq!(normalize("../x.md"), "../x.md");
        assert_eq!(normalize("a/../../x.md"), "../x.md");
        assert_eq!(normalize("a//b/"), "a/b/");
        assert_eq!(normalize("./"), "");
    }

    #[test]
    fn test_rebase_keeps_suffix_and_absolute_links() {
        assert_eq!(rebase("setup.md#install", "guide"), "guide/setup.md#install");
        assert_eq!(rebase("../api/", "guide/intro"), "guide/api/");
        assert_eq!(rebase("https://example.com", "guide"), "https://example.com");
        assert_eq!(rebase("/root.md", "guide"), "/root.md");
        assert_eq!(rebase("page.md", ""), "page.md");
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(relative_to("a/b", "a/toc.yml"), "../toc.yml");
        assert_eq!(relative_to("", "sub/toc.md"), "sub/toc.md");
        assert_eq!(relative_to("a/b", "a/b/toc.yml"), "toc.yml");
        assert_eq!(relative_to("x", "y/toc.yml"), "../y/toc.yml");
    }

    #[test]
    fn test_parent_dir_and_depth() {
        assert_eq!(parent_dir("a/b/toc.yml"), "a/b");
        assert_eq!(parent_dir("toc.yml"), "");
        assert_eq!(depth("a/b"), 2);
        assert_eq!(depth(""), 0);
    }
}
