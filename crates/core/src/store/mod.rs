//! Storage capabilities behind the cache.
//!
//! The engine talks to two external collaborators through these traits:
//!
//! - [`MetadataStore`]: one [`CacheRecord`] per URL, keyed by table name and URL.
//! - [`ObjectStore`]: blob bodies addressed by bucket and key.
//!
//! Both have overwrite semantics and no versioning. [`CacheDb`] implements
//! both on SQLite; the [`memory`] module provides in-process fakes.

pub mod connection;
pub mod memory;
pub mod migrations;
pub mod objects;
pub mod records;

use bytes::Bytes;

pub use crate::Error;
use crate::record::CacheRecord;

pub use connection::CacheDb;
pub use memory::{MemoryMetadataStore, MemoryObjectStore};

/// Key-value store holding the metadata record for each cached URL.
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Read the record for `url` from `table`, or `None` if absent.
    async fn get_record(&self, table: &str, url: &str) -> Result<Option<CacheRecord>, Error>;

    /// Write `record` to `table`, replacing any previous record for its URL.
    async fn put_record(&self, table: &str, record: &CacheRecord) -> Result<(), Error>;
}

/// Durable blob storage addressed by bucket and key.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` at `(bucket, key)`, replacing any existing object.
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes, content_type: Option<&str>) -> Result<(), Error>;

    /// Read the object at `(bucket, key)`, or `None` if absent.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, Error>;
}

/// An object as held by an [`ObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: Option<String>,
}
