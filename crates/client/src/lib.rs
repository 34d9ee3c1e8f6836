//! Client code for url-cache.
//!
//! This crate provides the origin fetcher and the cache decision engine
//! that ties it to the metadata and object stores from `urlcache-core`.

pub mod engine;
pub mod fetch;

pub use engine::{CacheSettings, DefaultUrlCache, Freshness, OpenError, UrlCache, freshness, new_object_key, open};

pub use fetch::{FetchConfig, FetchResponse, Fetcher, HeaderSnapshot, HttpFetcher};
