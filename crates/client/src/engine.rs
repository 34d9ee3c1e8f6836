//! The cache decision engine.
//!
//! For one URL per call, [`UrlCache::cache`] decides whether the stored copy
//! is absent, fresh, or stale and drives the fetcher and the two stores:
//!
//! ```text
//! lookup ─ absent ─────────────────────────────> store cycle (new key)  => added
//!        └ present ─ probe ─ fresh ───────────────────────────────────> => cached
//!                          └ stale ─> store cycle (same bucket/key)      => updated
//! ```
//!
//! The store cycle is fetch body, write blob, write record, in that order.
//! Every step runs once; the first failure aborts the call.
//!
//! The engine holds no state between calls and takes no per-URL lock. Two
//! concurrent calls for the same URL that both see it absent or stale both
//! run a store cycle. For an absent URL that means two blobs under two keys,
//! and whichever metadata write lands last wins; the other blob is orphaned.

use uuid::Uuid;

use crate::fetch::{FetchConfig, Fetcher, HeaderSnapshot, HttpFetcher};
use urlcache_core::{
    AppConfig, CacheDb, CacheEntry, CacheError, CacheRecord, CacheStatus, ConfigError, Error, FetchError,
    MetadataStore, ObjectStore, Revalidators,
};

/// Where new entries go and which metadata table records live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub bucket: String,
    pub table: String,
}

impl From<&AppConfig> for CacheSettings {
    fn from(config: &AppConfig) -> Self {
        Self { bucket: config.bucket.clone(), table: config.table.clone() }
    }
}

/// Result of comparing stored revalidators with a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// Judge a stored copy against the origin's current headers.
///
/// A stored ETag is authoritative when the origin also sends one: equal means
/// fresh, different means stale regardless of Last-Modified. Otherwise an
/// exactly equal Last-Modified means fresh. Anything else, including a record
/// with no revalidators at all, is stale.
pub fn freshness(stored: &Revalidators, probe: &HeaderSnapshot) -> Freshness {
    if let (Some(stored), Some(current)) = (stored.etag.as_deref(), probe.etag()) {
        return if stored == current { Freshness::Fresh } else { Freshness::Stale };
    }

    match (stored.last_modified.as_deref(), probe.last_modified()) {
        (Some(stored), Some(current)) if stored == current => Freshness::Fresh,
        _ => Freshness::Stale,
    }
}

/// A fresh object-store key: a time-ordered UUID.
pub fn new_object_key() -> String {
    Uuid::now_v7().to_string()
}

/// Revalidation cache over injected stores and fetcher.
#[derive(Debug, Clone)]
pub struct UrlCache<M, O, F> {
    metadata: M,
    objects: O,
    fetcher: F,
    settings: CacheSettings,
}

/// The production wiring: SQLite for both stores, reqwest for the origin.
pub type DefaultUrlCache = UrlCache<CacheDb, CacheDb, HttpFetcher>;

/// Failure to assemble a [`DefaultUrlCache`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open store: {0}")]
    Store(#[from] Error),

    #[error("failed to build fetcher: {0}")]
    Fetcher(#[from] FetchError),
}

/// Open the database named by `config` and build a cache on top of it.
pub async fn open(config: &AppConfig) -> Result<DefaultUrlCache, OpenError> {
    config.validate()?;

    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = HttpFetcher::new(FetchConfig::from(config))?;

    tracing::info!(bucket = %config.bucket, table = %config.table, "url cache ready");

    Ok(UrlCache::new(db.clone(), db, fetcher, CacheSettings::from(config)))
}

impl<M, O, F> UrlCache<M, O, F>
where
    M: MetadataStore,
    O: ObjectStore,
    F: Fetcher,
{
    pub fn new(metadata: M, objects: O, fetcher: F, settings: CacheSettings) -> Self {
        Self { metadata, objects, fetcher, settings }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn objects(&self) -> &O {
        &self.objects
    }

    /// Ensure a current copy of `url` is stored and report what was done.
    ///
    /// # Errors
    ///
    /// - [`CacheError::MetadataLookupFailed`] if the record cannot be read.
    /// - [`CacheError::OriginUnreachable`] if the probe or fetch fails or
    ///   answers with anything but 200. The existing record is untouched.
    /// - [`CacheError::BlobWriteFailed`] if the body cannot be stored. No
    ///   metadata is written.
    /// - [`CacheError::MetadataWriteFailed`] if the record cannot be written
    ///   after the blob was.
    pub async fn cache(&self, url: &str) -> Result<CacheEntry, CacheError> {
        let existing = self
            .metadata
            .get_record(&self.settings.table, url)
            .await
            .map_err(|source| CacheError::MetadataLookupFailed { url: url.to_string(), source })?;

        let Some(record) = existing else {
            let key = new_object_key();
            tracing::debug!("no record for {}, caching under {}/{}", url, self.settings.bucket, key);

            let record = self.store(url, &self.settings.bucket, &key).await?;
            return Ok(self.finish(CacheStatus::Added, record));
        };

        let probe = self
            .fetcher
            .probe(url)
            .await
            .map_err(|source| CacheError::OriginUnreachable { url: url.to_string(), source })?;

        match freshness(&record.revalidators, &probe) {
            Freshness::Fresh => Ok(self.finish(CacheStatus::Cached, record)),
            Freshness::Stale => {
                tracing::debug!("{} changed at origin, refreshing {}/{}", url, record.bucket, record.key);

                let updated = self.store(url, &record.bucket, &record.key).await?;
                Ok(self.finish(CacheStatus::Updated, updated))
            }
        }
    }

    /// Fetch the body, write the blob, then write the record.
    async fn store(&self, url: &str, bucket: &str, key: &str) -> Result<CacheRecord, CacheError> {
        let response = self
            .fetcher
            .fetch_body(url)
            .await
            .map_err(|source| CacheError::OriginUnreachable { url: url.to_string(), source })?;

        let size = response.bytes.len();
        self.objects
            .put_object(bucket, key, response.bytes, response.headers.content_type())
            .await
            .map_err(|source| CacheError::BlobWriteFailed {
                url: url.to_string(),
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })?;

        let record = CacheRecord {
            url: url.to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            revalidators: response.headers.revalidators(),
            headers: response.headers.metadata_headers(),
        };

        if let Err(source) = self.metadata.put_record(&self.settings.table, &record).await {
            tracing::warn!(
                url,
                bucket,
                key,
                error = %source,
                "blob written but metadata record was not; object store is ahead of metadata"
            );
            return Err(CacheError::MetadataWriteFailed {
                url: url.to_string(),
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            });
        }

        tracing::debug!("stored {} bytes for {} in {}ms", size, url, response.fetch_ms);

        Ok(record)
    }

    fn finish(&self, status: CacheStatus, record: CacheRecord) -> CacheEntry {
        tracing::info!(
            url = %record.url,
            status = %status,
            bucket = %record.bucket,
            key = %record.key,
            "cache call complete"
        );
        CacheEntry::new(status, record)
    }
}
