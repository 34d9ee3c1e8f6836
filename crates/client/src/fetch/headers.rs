//! Flat, case-insensitive view of origin response headers.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use urlcache_core::{MetadataHeaders, Revalidators};

/// Response headers as a flat string mapping.
///
/// Names are stored lowercase and looked up case-insensitively. A header
/// that is missing, empty, or not valid UTF-8 is absent; it is never
/// represented as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSnapshot {
    headers: BTreeMap<String, String>,
}

impl HeaderSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every header of a response. Repeated headers are joined with `", "`.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut snapshot = Self::new();
        for name in map.keys() {
            let values: Vec<&str> = map
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect();
            if !values.is_empty() {
                snapshot.insert(name.as_str(), values.join(", "));
            }
        }
        snapshot
    }

    /// Set a header, replacing any previous value. Empty values remove it.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let name = name.to_ascii_lowercase();
        if value.is_empty() {
            self.headers.remove(&name);
        } else {
            self.headers.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn etag(&self) -> Option<&str> {
        self.get("etag")
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.get("last-modified")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type")
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// The freshness headers worth persisting.
    pub fn revalidators(&self) -> Revalidators {
        Revalidators { etag: self.owned("etag"), last_modified: self.owned("last-modified") }
    }

    /// The auxiliary headers worth persisting, each only if present.
    pub fn metadata_headers(&self) -> MetadataHeaders {
        MetadataHeaders {
            content_type: self.owned("content-type"),
            content_length: self.owned("content-length"),
            content_encoding: self.owned("content-encoding"),
            content_language: self.owned("content-language"),
            content_location: self.owned("content-location"),
            content_md5: self.owned("content-md5"),
            date: self.owned("date"),
            expires: self.owned("expires"),
            age: self.owned("age"),
            cache_control: self.owned("cache-control"),
        }
    }

    fn owned(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (name, value) in iter {
            snapshot.insert(name.as_ref(), value);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{self, HeaderValue};

    #[test]
    fn test_case_insensitive_lookup() {
        let snapshot: HeaderSnapshot = [("ETag", "\"abc\""), ("Content-Type", "text/html")].into_iter().collect();
        assert_eq!(snapshot.get("etag"), Some("\"abc\""));
        assert_eq!(snapshot.get("ETAG"), Some("\"abc\""));
        assert_eq!(snapshot.content_type(), Some("text/html"));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let mut map = HeaderMap::new();
        map.insert(header::ETAG, HeaderValue::from_static(""));
        map.insert(header::LAST_MODIFIED, HeaderValue::from_static("Mon, 01 Jan 2024 00:00:00 GMT"));

        let snapshot = HeaderSnapshot::from_header_map(&map);
        assert_eq!(snapshot.etag(), None);
        assert_eq!(snapshot.last_modified(), Some("Mon, 01 Jan 2024 00:00:00 GMT"));

        let mut snapshot = snapshot;
        snapshot.insert("last-modified", "");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_repeated_headers_joined() {
        let mut map = HeaderMap::new();
        map.append(header::CACHE_CONTROL, HeaderValue::from_static("public"));
        map.append(header::CACHE_CONTROL, HeaderValue::from_static("max-age=60"));

        let snapshot = HeaderSnapshot::from_header_map(&map);
        assert_eq!(snapshot.get("cache-control"), Some("public, max-age=60"));
    }

    #[test]
    fn test_projections_keep_only_present_headers() {
        let snapshot: HeaderSnapshot = [
            ("etag", "\"v1\""),
            ("content-type", "image/png"),
            ("content-length", "2048"),
            ("age", "12"),
            ("x-served-by", "edge-1"),
        ]
        .into_iter()
        .collect();

        let revalidators = snapshot.revalidators();
        assert_eq!(revalidators.etag.as_deref(), Some("\"v1\""));
        assert!(revalidators.last_modified.is_none());

        let headers = snapshot.metadata_headers();
        assert_eq!(headers.content_type.as_deref(), Some("image/png"));
        assert_eq!(headers.content_length.as_deref(), Some("2048"));
        assert_eq!(headers.age.as_deref(), Some("12"));
        assert!(headers.content_encoding.is_none());
        assert!(headers.expires.is_none());
        assert!(headers.cache_control.is_none());
    }
}
