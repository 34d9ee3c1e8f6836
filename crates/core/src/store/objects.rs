//! Blob persistence in the `objects` table.

use super::connection::CacheDb;
use super::{ObjectStore, StoredObject};
use crate::Error;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Count objects stored under `bucket`.
    pub async fn count_objects(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM objects WHERE bucket = ?1", params![bucket], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl ObjectStore for CacheDb {
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes, content_type: Option<&str>) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        let content_type = content_type.map(str::to_string);
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO objects (bucket, object_key, content_type, body, size_bytes, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![&bucket, &key, &content_type, &body[..], body.len() as i64, &stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, Error> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredObject>, Error> {
                let mut stmt = conn.prepare("SELECT body, content_type FROM objects WHERE bucket = ?1 AND object_key = ?2")?;

                let result = stmt.query_row(params![bucket, key], |row| {
                    let body: Vec<u8> = row.get(0)?;
                    Ok(StoredObject { body: Bytes::from(body), content_type: row.get(1)? })
                });

                match result {
                    Ok(object) => Ok(Some(object)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}
