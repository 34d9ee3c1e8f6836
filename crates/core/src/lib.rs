//! Core types and shared functionality for url-cache.
//!
//! This crate provides:
//! - Cache records and outcome statuses
//! - Unified error types
//! - Configuration structures
//! - Metadata and object store capabilities, with SQLite and in-memory backends

pub mod config;
pub mod error;
pub mod record;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::{CacheError, CacheErrorKind, Error, FetchError};
pub use record::{CacheEntry, CacheRecord, CacheStatus, MetadataHeaders, Revalidators};
pub use store::{CacheDb, MetadataStore, ObjectStore, StoredObject};
