//! Cross-reference map model.
//!
//! A map is the serialized `### YamlMime:XRefMap` document published next to
//! a built docset:
//!
//! ```yaml
//! baseUrl: https://example.com/api/
//! sorted: true
//! redirections:
//!   - uidPrefix: System.
//!     href: https://learn.example.com/dotnet/api/{0}.html
//! references:
//!   - uid: MyLib.Widget
//!     name: Widget
//!     href: MyLib.Widget.html
//! ```

use std::collections::BTreeMap;

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

use crate::href;

/// Placeholder substituted by the uid remainder in redirection hrefs.
const REDIRECT_PLACEHOLDER: &str = "{0}";

/// One uid to href record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XRefSpec {
    /// Symbolic identity.
    pub uid: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Link target, relative to the map's base URL unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Compiler-style identity of the symbol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
    /// Whether the record describes a generic specialization.
    ///
    /// Published maps may write it as `"True"`/`"False"`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_flag"
    )]
    pub is_spec: Option<bool>,
    /// Any further fields (`fullName`, `nameWithType`, ...).
    #[serde(flatten)]
    pub others: BTreeMap<String, serde_json::Value>,
}

/// Accept a boolean or its case-insensitive string spelling.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(value)) => Ok(Some(value)),
        Some(Flag::Text(text)) if text.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Flag::Text(text)) if text.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(Flag::Text(text)) => Err(de::Error::invalid_value(
            Unexpected::Str(&text),
            &"a boolean",
        )),
    }
}

impl XRefSpec {
    /// Create a record for `uid` pointing at `href`.
    #[must_use]
    pub fn new(uid: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            href: Some(href.into()),
            ..Self::default()
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Prefix rule resolving uids that have no explicit record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XRefMapRedirection {
    /// Literal uid prefix.
    pub uid_prefix: String,
    /// Target href; `{0}` is replaced by the rest of the uid.
    pub href: String,
}

impl XRefMapRedirection {
    /// Create a redirection.
    #[must_use]
    pub fn new(uid_prefix: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            uid_prefix: uid_prefix.into(),
            href: href.into(),
        }
    }
}

/// Collection of [`XRefSpec`] records with a shared base URL.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XRefMap {
    /// Base that relative record hrefs are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Whether `references` is ordered by uid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorted: Option<bool>,
    /// Whether `base_url` has already been rebased onto the map location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href_updated: Option<bool>,
    /// Prefix rules consulted when no record matches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirections: Vec<XRefMapRedirection>,
    /// Records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<XRefSpec>,
    /// Unrecognized top-level fields.
    #[serde(flatten)]
    pub others: BTreeMap<String, serde_json::Value>,
}

impl XRefMap {
    /// Create a map from records.
    #[must_use]
    pub fn new(references: Vec<XRefSpec>) -> Self {
        Self {
            references,
            ..Self::default()
        }
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a redirection rule.
    #[must_use]
    pub fn with_redirection(mut self, redirection: XRefMapRedirection) -> Self {
        self.redirections.push(redirection);
        self
    }

    fn is_sorted(&self) -> bool {
        self.sorted == Some(true)
    }

    /// Order records by ordinal uid so lookups can binary search.
    ///
    /// Records sharing a uid keep their relative order.
    pub fn sort(&mut self) {
        self.references.sort_by(|a, b| a.uid.cmp(&b.uid));
        self.sorted = Some(true);
    }

    /// Record for `uid` as stored, without href resolution.
    ///
    /// When several records share the uid the first one wins.
    #[must_use]
    pub fn find_spec(&self, uid: &str) -> Option<&XRefSpec> {
        if self.is_sorted() {
            let index = self
                .references
                .partition_point(|spec| spec.uid.as_str() < uid);
            self.references.get(index).filter(|spec| spec.uid == uid)
        } else {
            self.references.iter().find(|spec| spec.uid == uid)
        }
    }

    /// Href of the redirection rule covering `uid`, if any.
    ///
    /// The longest matching prefix wins; among equally long prefixes the
    /// first declared one does.
    #[must_use]
    pub fn find_redirect(&self, uid: &str) -> Option<String> {
        let mut best: Option<&XRefMapRedirection> = None;
        for redirection in &self.redirections {
            if uid.starts_with(&redirection.uid_prefix)
                && best.is_none_or(|b| redirection.uid_prefix.len() > b.uid_prefix.len())
            {
                best = Some(redirection);
            }
        }
        let redirection = best?;
        let remainder = &uid[redirection.uid_prefix.len()..];
        Some(redirection.href.replace(REDIRECT_PLACEHOLDER, remainder))
    }

    /// Resolve `uid` to a record with its href made absolute.
    ///
    /// Explicit records take precedence over redirections.
    #[must_use]
    pub fn find(&self, uid: &str) -> Option<XRefSpec> {
        let mut spec = match self.find_spec(uid) {
            Some(spec) => spec.clone(),
            None => XRefSpec::new(uid, self.find_redirect(uid)?),
        };
        spec.href = spec.href.map(|h| self.resolve_href(&h));
        Some(spec)
    }

    fn resolve_href(&self, value: &str) -> String {
        match self.base_url.as_deref() {
            Some(base) => href::join(base, value),
            None => value.to_owned(),
        }
    }

    /// Anchor the base URL onto the directory the map was fetched from.
    ///
    /// An absent or empty base becomes `location_dir`; a relative base is
    /// resolved against it. Maps already marked `hrefUpdated` are untouched.
    pub fn rebase(&mut self, location_dir: &str) {
        if self.href_updated == Some(true) {
            return;
        }
        self.base_url = match self.base_url.as_deref() {
            None | Some("") => Some(location_dir.to_owned()),
            Some(base) if href::has_scheme(base) => Some(base.to_owned()),
            Some(base) => Some(href::join(&with_trailing_slash(location_dir), base)),
        };
        self.href_updated = Some(true);
    }
}

fn with_trailing_slash(dir: &str) -> String {
    if dir.is_empty() || dir.ends_with('/') {
        dir.to_owned()
    } else {
        format!("{dir}/")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> XRefMap {
        XRefMap::new(vec![
            XRefSpec::new("B.Type", "B.Type.html"),
            XRefSpec::new("A.Type", "A.Type.html").with_name("first"),
            XRefSpec::new("A.Type", "Other.html").with_name("second"),
        ])
    }

    #[test]
    fn test_find_spec_unsorted_and_sorted() {
        let mut map = sample();
        assert_eq!(map.find_spec("A.Type").unwrap().name.as_deref(), Some("first"));

        map.sort();
        assert_eq!(map.sorted, Some(true));
        assert_eq!(map.references[0].uid, "A.Type");
        assert_eq!(map.find_spec("A.Type").unwrap().name.as_deref(), Some("first"));
        assert_eq!(map.find_spec("B.Type").unwrap().uid, "B.Type");
        assert!(map.find_spec("C.Type").is_none());
        assert!(map.find_spec("A").is_none());
    }

    #[test]
    fn test_redirection_substitutes_remainder() {
        let map = XRefMap::default()
            .with_redirection(XRefMapRedirection::new("System.", "https://x/{0}.html"));
        let spec = map.find("System.String").unwrap();
        assert_eq!(spec.uid, "System.String");
        assert_eq!(spec.href.as_deref(), Some("https://x/String.html"));
    }

    #[test]
    fn test_redirection_longest_prefix_wins() {
        let map = XRefMap::default()
            .with_redirection(XRefMapRedirection::new("System.", "https://a/{0}"))
            .with_redirection(XRefMapRedirection::new("System.IO.", "https://b/{0}"))
            .with_redirection(XRefMapRedirection::new("System.", "https://c/{0}"));

        assert_eq!(map.find_redirect("System.IO.File").as_deref(), Some("https://b/File"));
        assert_eq!(map.find_redirect("System.Int32").as_deref(), Some("https://a/Int32"));
        assert!(map.find_redirect("Microsoft.X").is_none());
    }

    #[test]
    fn test_redirection_without_placeholder_is_literal() {
        let map = XRefMap::default()
            .with_redirection(XRefMapRedirection::new("Legacy.", "https://x/legacy.html"));
        assert_eq!(
            map.find_redirect("Legacy.Thing").as_deref(),
            Some("https://x/legacy.html")
        );
    }

    #[test]
    fn test_explicit_record_beats_redirection() {
        let map = XRefMap::new(vec![XRefSpec::new("System.String", "string.html")])
            .with_base_url("https://docs.example.com/api/")
            .with_redirection(XRefMapRedirection::new("System.", "https://x/{0}.html"));
        assert_eq!(
            map.find("System.String").unwrap().href.as_deref(),
            Some("https://docs.example.com/api/string.html")
        );
    }

    #[test]
    fn test_find_keeps_absolute_href() {
        let map = XRefMap::new(vec![XRefSpec::new("A", "https://other.org/a.html")])
            .with_base_url("https://docs.example.com/");
        assert_eq!(
            map.find("A").unwrap().href.as_deref(),
            Some("https://other.org/a.html")
        );
    }

    #[test]
    fn test_rebase_rules() {
        let mut map = XRefMap::default();
        map.rebase("https://example.com/api/");
        assert_eq!(map.base_url.as_deref(), Some("https://example.com/api/"));
        assert_eq!(map.href_updated, Some(true));

        let mut map = XRefMap::default().with_base_url("../docs/");
        map.rebase("https://example.com/api/");
        assert_eq!(map.base_url.as_deref(), Some("https://example.com/docs/"));

        let mut map = XRefMap::default().with_base_url("sub");
        map.rebase("/srv/maps");
        assert_eq!(map.base_url.as_deref(), Some("/srv/maps/sub"));

        let mut map = XRefMap::default().with_base_url("https://fixed/");
        map.rebase("/srv/maps");
        assert_eq!(map.base_url.as_deref(), Some("https://fixed/"));

        let mut map = XRefMap::default().with_base_url("keep/");
        map.href_updated = Some(true);
        map.rebase("/srv/maps");
        assert_eq!(map.base_url.as_deref(), Some("keep/"));
    }

    #[test]
    fn test_yaml_round_trip_keeps_unknown_fields() {
        let yaml = "### YamlMime:XRefMap\nbaseUrl: https://example.com/\nsorted: true\nredirections:\n- uidPrefix: System.\n  href: https://x/{0}.html\nreferences:\n- uid: A\n  name: A\n  href: a.html\n  commentId: T:A\n  isSpec: false\n  fullName: Lib.A\n";
        let map: XRefMap = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(map.references[0].comment_id.as_deref(), Some("T:A"));
        assert_eq!(
            map.references[0].others.get("fullName"),
            Some(&serde_json::json!("Lib.A"))
        );

        let reparsed: XRefMap = serde_yaml::from_str(&serde_yaml::to_string(&map).unwrap()).unwrap();
        assert_eq!(reparsed, map);
        let reparsed: XRefMap = serde_json::from_str(&serde_json::to_string(&map).unwrap()).unwrap();
        assert_eq!(reparsed, map);
    }

    #[test]
    fn test_is_spec_accepts_string_spelling() {
        let yaml = "references:\n- uid: A\n  isSpec: \"True\"\n- uid: B\n  isSpec: \"False\"\n- uid: C\n  isSpec: true\n- uid: D\n";
        let map: XRefMap = serde_yaml::from_str(yaml).unwrap();
        let flags: Vec<_> = map.references.iter().map(|spec| spec.is_spec).collect();
        assert_eq!(flags, vec![Some(true), Some(false), Some(true), None]);

        let json = r#"{"references":[{"uid":"A","isSpec":"True"}]}"#;
        let map: XRefMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.references[0].is_spec, Some(true));
    }

    #[test]
    fn test_is_spec_rejects_other_strings() {
        let yaml = "references:\n- uid: A\n  isSpec: maybe\n";
        assert!(serde_yaml::from_str::<XRefMap>(yaml).is_err());
    }
}
