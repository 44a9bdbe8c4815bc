//! SQLite implementation of the cache store adapter.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::connection::CacheDb;
use super::storage::CacheStorage;
use crate::{Error, RequestKey, StoredResponse};

const UPSERT_ENTRY: &str = "INSERT INTO cache_entries (
        store_name, key_hash, method, url,
        status_code, response_url, headers_json, body, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(store_name, key_hash) DO UPDATE SET
        method = excluded.method,
        url = excluded.url,
        status_code = excluded.status_code,
        response_url = excluded.response_url,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

const CREATE_STORE: &str = "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)";

/// Row shape shared by every insert path.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    response_url: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn encode(key: &RequestKey, response: &StoredResponse) -> Result<Self, Error> {
        Ok(Self {
            key_hash: key.hash(),
            method: key.method.clone(),
            url: key.url.clone(),
            status: response.status,
            response_url: response.url.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
        })
    }

    fn insert(&self, conn: &rusqlite::Connection, store: &str, stored_at: &str) -> Result<(), Error> {
        conn.execute(
            UPSERT_ENTRY,
            params![
                store,
                &self.key_hash,
                &self.method,
                &self.url,
                i64::from(self.status),
                &self.response_url,
                &self.headers_json,
                &self.body,
                stored_at,
            ],
        )?;
        Ok(())
    }
}

type RawEntry = (i64, String, String, Vec<u8>);

fn read_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode_response(status: i64, url: String, headers_json: &str, body: Vec<u8>) -> Result<StoredResponse, Error> {
    let status = u16::try_from(status).map_err(|_| Error::Serialization(format!("invalid status code {status}")))?;
    let headers: Vec<(String, String)> = serde_json::from_str(headers_json)?;
    Ok(StoredResponse { url, status, headers, body: Bytes::from(body) })
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(CREATE_STORE, params![name, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, name: &str, key: &RequestKey, response: &StoredResponse) -> Result<(), Error> {
        let name = name.to_string();
        let row = EntryRow::encode(key, response)?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(CREATE_STORE, params![&name, &now])?;
                row.insert(&tx, &name, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, name: &str, entries: &[(RequestKey, StoredResponse)]) -> Result<(), Error> {
        let name = name.to_string();
        let rows = entries
            .iter()
            .map(|(key, response)| EntryRow::encode(key, response))
            .collect::<Result<Vec<_>, _>>()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(CREATE_STORE, params![&name, &now])?;
                for row in &rows {
                    row.insert(&tx, &name, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup(&self, name: &str, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let name = name.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status_code, response_url, headers_json, body
                        FROM cache_entries WHERE store_name = ?1 AND key_hash = ?2",
                        params![name, key_hash],
                        read_entry,
                    )
                    .optional()?;

                row.map(|(status, url, headers, body)| decode_response(status, url, &headers, body))
                    .transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup_any(&self, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status_code, e.response_url, e.headers_json, e.body
                        FROM cache_entries e
                        JOIN cache_stores s ON s.name = e.store_name
                        WHERE e.key_hash = ?1
                        ORDER BY s.rowid ASC
                        LIMIT 1",
                        params![key_hash],
                        read_entry,
                    )
                    .optional()?;

                row.map(|(status, url, headers, body)| decode_response(status, url, &headers, body))
                    .transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn requests(&self, name: &str) -> Result<Vec<RequestKey>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url FROM cache_entries WHERE store_name = ?1 ORDER BY rowid ASC",
                )?;
                let keys = stmt
                    .query_map(params![name], |row| {
                        Ok(RequestKey { method: row.get(0)?, url: row.get(1)? })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
