//! Unified error types for url-cache.
//!
//! Three layers: [`Error`] for the stores, [`FetchError`] for the origin,
//! and [`CacheError`] for a whole `cache(url)` invocation.

use std::fmt;

use tokio_rusqlite::rusqlite;

/// Storage-layer errors shared by the metadata and object stores.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A persisted row could not be turned back into a record.
    #[error("STORE_ERROR: invalid record: {0}")]
    InvalidRecord(String),

    /// The backend refused or could not serve the request.
    #[error("STORE_UNAVAILABLE: {0}")]
    Unavailable(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

/// Failures talking to the origin server.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The URL could not be parsed; no request was made.
    #[error("INVALID_URL: {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The origin answered with something other than 200.
    #[error("HTTP_ERROR: request url status error: {status} ({url})")]
    Status { url: String, status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("FETCH_TIMEOUT: {url}")]
    Timeout { url: String },

    /// DNS, connection, TLS or body read failure.
    #[error("NETWORK_ERROR: {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The HTTP client itself could not be constructed.
    #[error("CLIENT_ERROR: failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// HTTP status code, when the origin answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure kinds of a `cache(url)` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheErrorKind {
    MetadataLookupFailed,
    OriginUnreachable,
    BlobWriteFailed,
    MetadataWriteFailed,
}

impl fmt::Display for CacheErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CacheErrorKind::MetadataLookupFailed => "METADATA_LOOKUP_FAILED",
            CacheErrorKind::OriginUnreachable => "ORIGIN_UNREACHABLE",
            CacheErrorKind::BlobWriteFailed => "BLOB_WRITE_FAILED",
            CacheErrorKind::MetadataWriteFailed => "METADATA_WRITE_FAILED",
        };
        f.write_str(code)
    }
}

/// Terminal failure of a single `cache(url)` invocation.
///
/// Every variant aborts the rest of the pipeline. None are retried.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading the metadata store failed before any network call.
    #[error("METADATA_LOOKUP_FAILED: {url}: {source}")]
    MetadataLookupFailed {
        url: String,
        #[source]
        source: Error,
    },

    /// The probe or the full fetch failed (transport error or non-200).
    #[error("ORIGIN_UNREACHABLE: {url}: {source}")]
    OriginUnreachable {
        url: String,
        #[source]
        source: FetchError,
    },

    /// The body could not be written; metadata was not touched.
    #[error("BLOB_WRITE_FAILED: {url} -> {bucket}/{key}: {source}")]
    BlobWriteFailed {
        url: String,
        bucket: String,
        key: String,
        #[source]
        source: Error,
    },

    /// The blob is durable but the metadata record was not written.
    #[error("METADATA_WRITE_FAILED: {url} -> {bucket}/{key}: {source}")]
    MetadataWriteFailed {
        url: String,
        bucket: String,
        key: String,
        #[source]
        source: Error,
    },
}

impl CacheError {
    pub fn kind(&self) -> CacheErrorKind {
        match self {
            CacheError::MetadataLookupFailed { .. } => CacheErrorKind::MetadataLookupFailed,
            CacheError::OriginUnreachable { .. } => CacheErrorKind::OriginUnreachable,
            CacheError::BlobWriteFailed { .. } => CacheErrorKind::BlobWriteFailed,
            CacheError::MetadataWriteFailed { .. } => CacheErrorKind::MetadataWriteFailed,
        }
    }

    /// The URL the failed invocation was caching.
    pub fn url(&self) -> &str {
        match self {
            CacheError::MetadataLookupFailed { url, .. }
            | CacheError::OriginUnreachable { url, .. }
            | CacheError::BlobWriteFailed { url, .. }
            | CacheError::MetadataWriteFailed { url, .. } => url,
        }
    }

    /// Origin status code, if the failure came from a non-200 answer.
    pub fn status(&self) -> Option<u16> {
        match self {
            CacheError::OriginUnreachable { source, .. } => source.status(),
            _ => None,
        }
    }
}
