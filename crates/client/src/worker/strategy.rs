//! Per-route caching strategies.
//!
//! Reads search every cache generation; writes only ever go to the current
//! one, and only after the response has been handed back.

use std::sync::Arc;

use shellkeep_core::{CacheStorage, Error, Request, StoredResponse};
use tokio::sync::oneshot;

use super::{CacheAgent, Served};
use crate::fetch::Fetcher;

/// Store `response` under the request's key in `name`.
///
/// Non-GET requests and partial responses are not cacheable and are
/// skipped. Failures are logged and dropped.
async fn write_entry(storage: &dyn CacheStorage, name: &str, request: &Request, response: &StoredResponse) {
    if !request.is_cacheable() || response.status == 206 {
        tracing::debug!(method = %request.method, url = %request.url, status = response.status, "not cacheable");
        return;
    }

    match storage.put(name, &request.key(), response).await {
        Ok(()) => tracing::debug!(cache = %name, url = %request.url, "cached response"),
        Err(err) => tracing::warn!(cache = %name, url = %request.url, error = %err, "cache write failed"),
    }
}

impl CacheAgent {
    /// Queue a background write of `response` into the current generation.
    fn cache_in_background(&self, request: &Request, response: StoredResponse) {
        let storage = Arc::clone(&self.storage);
        let name = self.manifest.cache_name.clone();
        let request = request.clone();
        self.background.spawn(async move {
            write_entry(storage.as_ref(), &name, &request, &response).await;
        });
    }

    /// Network first; on failure serve the pre-cached offline document.
    ///
    /// Returns `Ok(None)` when the network fails and no offline document
    /// is cached.
    pub(crate) async fn network_first_with_fallback(&self, request: &Request) -> Result<Option<Served>, Error> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.cache_in_background(request, response.clone());
                Ok(Some(Served::network(response)))
            }
            Err(err) => {
                tracing::info!(url = %request.url, error = %err, "navigation failed; serving offline document");
                let offline = self.storage.lookup_any(&self.offline_key).await?;
                if offline.is_none() {
                    tracing::warn!(url = %request.url, "offline document not cached");
                }
                Ok(offline.map(Served::offline_fallback))
            }
        }
    }

    /// Serve the cached copy at once and refresh it from the network.
    ///
    /// The fetch starts before the cache lookup and is not cancelled when a
    /// cached copy wins. Only a cache miss waits for it.
    pub(crate) async fn stale_while_revalidate(&self, request: &Request) -> Result<Served, Error> {
        let (tx, rx) = oneshot::channel();
        let fetcher: Arc<dyn Fetcher> = Arc::clone(&self.fetcher);
        let storage = Arc::clone(&self.storage);
        let name = self.manifest.cache_name.clone();
        let pending = request.clone();

        self.background.spawn(async move {
            let outcome = match fetcher.fetch(&pending).await {
                Ok(response) => {
                    write_entry(storage.as_ref(), &name, &pending, &response).await;
                    Ok(response)
                }
                Err(err) => {
                    tracing::warn!(url = %pending.url, error = %err, "revalidation failed");
                    Err(err)
                }
            };
            // Receiver is gone when the cached copy was served.
            let _ = tx.send(outcome);
        });

        let cached = self.storage.lookup_any(&request.key()).await?;
        if let Some(cached) = cached {
            tracing::debug!(url = %request.url, "serving cached copy; revalidating");
            return Ok(Served::cache(cached));
        }

        match rx.await {
            Ok(outcome) => outcome.map(Served::network),
            Err(_) => Err(Error::NoResponse(request.url.to_string())),
        }
    }

    /// Network first with no cache write; a cached copy only on failure.
    pub(crate) async fn network_first(&self, request: &Request) -> Result<Served, Error> {
        let err = match self.fetcher.fetch(request).await {
            Ok(response) => return Ok(Served::network(response)),
            Err(err) => err,
        };

        match self.storage.lookup_any(&request.key()).await? {
            Some(cached) => {
                tracing::info!(url = %request.url, error = %err, "network failed; serving cached copy");
                Ok(Served::cache(cached))
            }
            None => Err(err),
        }
    }
}
