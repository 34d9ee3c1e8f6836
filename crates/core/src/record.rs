//! Cache records and invocation outcomes.
//!
//! A [`CacheRecord`] is the one durable metadata entry kept per URL. It points
//! at the blob holding the cached bytes and carries the origin headers that
//! were captured when that blob was written.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Origin headers used to decide whether a cached copy is still current.
///
/// Either or both may be absent. With neither present, a record is never
/// judged fresh and every revisit refetches it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revalidators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl Revalidators {
    /// True when neither revalidator was captured.
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// Auxiliary response headers captured at fetch time.
///
/// Descriptive only. Values are kept as the origin sent them, so
/// `content_length` stays a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataHeaders {
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
    pub content_location: Option<String>,
    pub content_md5: Option<String>,
    pub date: Option<String>,
    pub expires: Option<String>,
    pub age: Option<String>,
    pub cache_control: Option<String>,
}

/// A cached URL: where its bytes live and what the origin said about them.
///
/// `url` is the primary key. `bucket` and `key` are assigned once, when the
/// record is created, and reused by every later update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub url: String,
    pub bucket: String,
    pub key: String,
    #[serde(default)]
    pub revalidators: Revalidators,
    #[serde(default)]
    pub headers: MetadataHeaders,
}

impl CacheRecord {
    pub fn new(url: impl Into<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bucket: bucket.into(),
            key: key.into(),
            revalidators: Revalidators::default(),
            headers: MetadataHeaders::default(),
        }
    }
}

/// What a single `cache(url)` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// No record existed; the resource was fetched and stored.
    Added,
    /// The origin confirmed the stored copy; nothing was written.
    Cached,
    /// The origin reported a change; blob and record were overwritten in place.
    Updated,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Added => "added",
            CacheStatus::Cached => "cached",
            CacheStatus::Updated => "updated",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record handed back to the caller, annotated with this call's outcome.
///
/// The status is transient and never persisted; `record` is exactly what the
/// metadata store holds after the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub status: CacheStatus,
    #[serde(flatten)]
    pub record: CacheRecord,
}

impl CacheEntry {
    pub fn new(status: CacheStatus, record: CacheRecord) -> Self {
        Self { status, record }
    }

    pub fn into_record(self) -> CacheRecord {
        self.record
    }
}
