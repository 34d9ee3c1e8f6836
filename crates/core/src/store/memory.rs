//! In-memory store backends.
//!
//! Cloning a store shares its contents, so a test can hand one clone to the
//! engine and inspect another. Failures can be switched on per operation to
//! exercise the engine's abort paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use tokio::sync::RwLock;

use super::{MetadataStore, ObjectStore, StoredObject};
use crate::Error;
use crate::record::CacheRecord;

#[derive(Debug, Default)]
struct Faults {
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl Faults {
    fn check_read(&self, what: &str) -> Result<(), Error> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Unavailable(format!("{what} read failed")));
        }
        Ok(())
    }

    fn check_write(&self, what: &str) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Unavailable(format!("{what} write failed")));
        }
        Ok(())
    }
}

/// Metadata store backed by a `HashMap` per table.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    tables: Arc<RwLock<HashMap<String, HashMap<String, CacheRecord>>>>,
    faults: Arc<Faults>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get_record` fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.faults.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `put_record` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.faults.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `put_record` calls so far.
    pub fn write_count(&self) -> usize {
        self.faults.writes.load(Ordering::SeqCst)
    }

    /// Number of records held in `table`.
    pub async fn record_count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, HashMap::len)
    }
}

#[async_trait::async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get_record(&self, table: &str, url: &str) -> Result<Option<CacheRecord>, Error> {
        self.faults.check_read("metadata")?;
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|t| t.get(url)).cloned())
    }

    async fn put_record(&self, table: &str, record: &CacheRecord) -> Result<(), Error> {
        self.faults.check_write("metadata")?;
        let mut tables = self.tables.write().await;
        tables
            .entry(table.to_string())
            .or_default()
            .insert(record.url.clone(), record.clone());
        self.faults.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Object store backed by a `HashMap` keyed on `(bucket, key)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<(String, String), StoredObject>>>,
    faults: Arc<Faults>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get_object` fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.faults.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `put_object` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.faults.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `put_object` calls so far.
    pub fn write_count(&self) -> usize {
        self.faults.writes.load(Ordering::SeqCst)
    }

    /// Number of distinct objects held.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes, content_type: Option<&str>) -> Result<(), Error> {
        self.faults.check_write("object")?;
        let object = StoredObject { body, content_type: content_type.map(str::to_string) };
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), object);
        self.faults.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, Error> {
        self.faults.check_read("object")?;
        let objects = self.objects.read().await;
        Ok(objects.get(&(bucket.to_string(), key.to_string())).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metadata_clones_share_state() {
        let store = MemoryMetadataStore::new();
        let other = store.clone();
        let record = CacheRecord::new("https://example.com/a", "url-cache", "k1");

        store.put_record("urls", &record).await.unwrap();

        assert_eq!(other.get_record("urls", &record.url).await.unwrap(), Some(record.clone()));
        assert_eq!(other.write_count(), 1);
        assert_eq!(other.record_count("urls").await, 1);
        assert_eq!(other.record_count("missing").await, 0);
    }

    #[tokio::test]
    async fn test_metadata_injected_failures() {
        let store = MemoryMetadataStore::new();
        let record = CacheRecord::new("https://example.com/a", "url-cache", "k1");

        store.fail_writes(true);
        assert!(matches!(store.put_record("urls", &record).await, Err(Error::Unavailable(_))));
        assert_eq!(store.write_count(), 0);

        store.fail_writes(false);
        store.put_record("urls", &record).await.unwrap();

        store.fail_reads(true);
        assert!(store.get_record("urls", &record.url).await.is_err());
    }

    #[tokio::test]
    async fn test_objects_overwrite_and_fail() {
        let store = MemoryObjectStore::new();
        store
            .put_object("url-cache", "k1", Bytes::from_static(b"one"), Some("text/plain"))
            .await
            .unwrap();
        store
            .put_object("url-cache", "k1", Bytes::from_static(b"two"), None)
            .await
            .unwrap();

        let object = store.get_object("url-cache", "k1").await.unwrap().unwrap();
        assert_eq!(object.body, Bytes::from_static(b"two"));
        assert_eq!(store.object_count().await, 1);
        assert_eq!(store.write_count(), 2);

        store.fail_writes(true);
        let result = store
            .put_object("url-cache", "k1", Bytes::from_static(b"three"), None)
            .await;
        assert!(result.is_err());
        let object = store.get_object("url-cache", "k1").await.unwrap().unwrap();
        assert_eq!(object.body, Bytes::from_static(b"two"));
    }
}
