//! Metadata record persistence.
//!
//! Each [`CacheRecord`] is one row in `records`, keyed by `(table_name, url)`.
//! Writes replace the whole row; there is no partial update.

use super::MetadataStore;
use super::connection::CacheDb;
use crate::Error;
use crate::record::{CacheRecord, MetadataHeaders, Revalidators};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Count records stored under `table`.
    pub async fn count_records(&self, table: &str) -> Result<u64, Error> {
        let table = table.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM records WHERE table_name = ?1", params![table], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl MetadataStore for CacheDb {
    async fn get_record(&self, table: &str, url: &str) -> Result<Option<CacheRecord>, Error> {
        let table = table.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT
                    url, bucket, object_key, etag, last_modified,
                    content_type, content_length, content_encoding, content_language,
                    content_location, content_md5, date, expires, age, cache_control
                FROM records WHERE table_name = ?1 AND url = ?2",
                )?;

                let result = stmt.query_row(params![table, url], |row| {
                    Ok(CacheRecord {
                        url: row.get(0)?,
                        bucket: row.get(1)?,
                        key: row.get(2)?,
                        revalidators: Revalidators { etag: row.get(3)?, last_modified: row.get(4)? },
                        headers: MetadataHeaders {
                            content_type: row.get(5)?,
                            content_length: row.get(6)?,
                            content_encoding: row.get(7)?,
                            content_language: row.get(8)?,
                            content_location: row.get(9)?,
                            content_md5: row.get(10)?,
                            date: row.get(11)?,
                            expires: row.get(12)?,
                            age: row.get(13)?,
                            cache_control: row.get(14)?,
                        },
                    })
                });

                match result {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put_record(&self, table: &str, record: &CacheRecord) -> Result<(), Error> {
        if record.url.is_empty() || record.bucket.is_empty() || record.key.is_empty() {
            return Err(Error::InvalidRecord(format!(
                "url, bucket and key are required (url={:?})",
                record.url
            )));
        }

        let table = table.to_string();
        let record = record.clone();
        let written_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO records (
                    table_name, url, bucket, object_key, etag, last_modified,
                    content_type, content_length, content_encoding, content_language,
                    content_location, content_md5, date, expires, age, cache_control,
                    written_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                          ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                    params![
                        &table,
                        &record.url,
                        &record.bucket,
                        &record.key,
                        &record.revalidators.etag,
                        &record.revalidators.last_modified,
                        &record.headers.content_type,
                        &record.headers.content_length,
                        &record.headers.content_encoding,
                        &record.headers.content_language,
                        &record.headers.content_location,
                        &record.headers.content_md5,
                        &record.headers.date,
                        &record.headers.expires,
                        &record.headers.age,
                        &record.headers.cache_control,
                        &written_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
