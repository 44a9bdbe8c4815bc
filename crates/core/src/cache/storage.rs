//! Cache store adapter contract.
//!
//! The worker never talks to SQLite directly; it goes through
//! [`CacheStorage`], which mirrors a browser-style cache registry: named
//! stores, each holding request-keyed response snapshots.

use async_trait::async_trait;

use crate::{Error, RequestKey, StoredResponse};

/// Asynchronous registry of named cache stores.
///
/// Implementations serialize concurrent writes to the same key themselves;
/// callers hold no locks. Writes to a store that does not exist yet create it.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named store if it does not exist.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Store a response under `key`, replacing any previous entry.
    async fn put(&self, name: &str, key: &RequestKey, response: &StoredResponse) -> Result<(), Error>;

    /// Store every entry or none of them.
    async fn put_all(&self, name: &str, entries: &[(RequestKey, StoredResponse)]) -> Result<(), Error>;

    /// Look up `key` in a single store.
    async fn lookup(&self, name: &str, key: &RequestKey) -> Result<Option<StoredResponse>, Error>;

    /// Look up `key` across all stores, oldest store first.
    async fn lookup_any(&self, key: &RequestKey) -> Result<Option<StoredResponse>, Error>;

    /// Request keys held by one store.
    async fn requests(&self, name: &str) -> Result<Vec<RequestKey>, Error>;

    /// Names of all stores, in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a store and all its entries. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;
}
